use std::cell::RefCell;
use std::rc::Rc;

use capture::{SessionSnapshot, TransportSettings};
use runtime::{Bounds, DAY_BOUNDS, FPS_BOUNDS};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement};

/// What a control asks the viewer to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlAction {
    Preview,
    Record,
    Stop,
    Days(u32),
    Fps(u32),
}

pub type Dispatch = Rc<dyn Fn(ControlAction)>;

type Listener = (EventTarget, &'static str, Closure<dyn FnMut(Event)>);

/// Find `#id`, or append a new `div#id` to the body. The flag is true when
/// the element was created here.
pub fn ensure_element(document: &Document, id: &str) -> Result<(HtmlElement, bool), JsValue> {
    if let Some(existing) = document.get_element_by_id(id) {
        return Ok((existing.dyn_into()?, false));
    }
    let element: HtmlElement = document.create_element("div")?.dyn_into()?;
    element.set_id(id);
    document
        .body()
        .ok_or_else(|| JsValue::from_str("missing body"))?
        .append_child(&element)?;
    Ok((element, true))
}

/// The control strip: day count, frame rate, Preview/Record/Stop and a
/// status line.
pub struct Controls {
    root: HtmlElement,
    owns_root: bool,
    days: HtmlInputElement,
    fps: HtmlInputElement,
    preview: HtmlButtonElement,
    record: HtmlButtonElement,
    stop: HtmlButtonElement,
    status: HtmlElement,
    listeners: RefCell<Vec<Listener>>,
}

impl Controls {
    pub fn mount(
        document: &Document,
        controls_id: &str,
        settings: TransportSettings,
        dispatch: Dispatch,
    ) -> Result<Self, JsValue> {
        let (root, owns_root) = ensure_element(document, controls_id)?;
        root.set_inner_html("");

        let days = number_input(document, &root, "Days", DAY_BOUNDS, settings.days)?;
        let fps = number_input(document, &root, "FPS", FPS_BOUNDS, settings.fps)?;
        let preview = button(document, &root, "Preview")?;
        let record = button(document, &root, "Record")?;
        let stop = button(document, &root, "Stop")?;
        let status: HtmlElement = document.create_element("span")?.dyn_into()?;
        status.set_class_name("timelapse-status");
        root.append_child(&status)?;

        let controls = Self {
            root,
            owns_root,
            days,
            fps,
            preview,
            record,
            stop,
            status,
            listeners: RefCell::new(Vec::new()),
        };

        controls.on_click(&controls.preview, &dispatch, ControlAction::Preview)?;
        controls.on_click(&controls.record, &dispatch, ControlAction::Record)?;
        controls.on_click(&controls.stop, &dispatch, ControlAction::Stop)?;
        controls.on_change(&controls.days, &dispatch, ControlAction::Days)?;
        controls.on_change(&controls.fps, &dispatch, ControlAction::Fps)?;
        Ok(controls)
    }

    /// Reflect `snapshot` in the button states and status line.
    pub fn render(&self, snapshot: &SessionSnapshot) {
        let policy = snapshot.policy;
        self.preview.set_disabled(!policy.preview);
        self.record.set_disabled(!policy.record);
        self.stop.set_disabled(!policy.stop);
        self.days.set_disabled(!policy.inputs);
        self.fps.set_disabled(!policy.inputs);
        self.status.set_text_content(Some(&snapshot.status));
    }

    /// Show the effective (clamped) values.
    pub fn set_values(&self, days: u32, fps: u32) {
        self.days.set_value_as_number(f64::from(days));
        self.fps.set_value_as_number(f64::from(fps));
    }

    /// Unhook every listener and remove whatever `mount` created.
    pub fn detach(&self) {
        for (target, event, closure) in self.listeners.borrow_mut().drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
        if self.owns_root {
            self.root.remove();
        } else {
            self.root.set_inner_html("");
        }
    }

    fn listen(
        &self,
        target: &EventTarget,
        event: &'static str,
        closure: Closure<dyn FnMut(Event)>,
    ) -> Result<(), JsValue> {
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners
            .borrow_mut()
            .push((target.clone(), event, closure));
        Ok(())
    }

    fn on_click(
        &self,
        button: &HtmlButtonElement,
        dispatch: &Dispatch,
        action: ControlAction,
    ) -> Result<(), JsValue> {
        let dispatch = Rc::clone(dispatch);
        let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| dispatch(action));
        self.listen(button, "click", closure)
    }

    fn on_change(
        &self,
        input: &HtmlInputElement,
        dispatch: &Dispatch,
        action: fn(u32) -> ControlAction,
    ) -> Result<(), JsValue> {
        let dispatch = Rc::clone(dispatch);
        let source = input.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            let value = source.value_as_number();
            if value.is_finite() && value >= 0.0 {
                dispatch(action(value.round() as u32));
            }
        });
        self.listen(input, "change", closure)
    }
}

fn number_input(
    document: &Document,
    root: &HtmlElement,
    label: &str,
    bounds: Bounds,
    value: u32,
) -> Result<HtmlInputElement, JsValue> {
    let wrapper = document.create_element("label")?;
    wrapper.set_text_content(Some(label));
    let input: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    input.set_type("number");
    input.set_min(&bounds.min.to_string());
    input.set_max(&bounds.max.to_string());
    input.set_step("1");
    input.set_value_as_number(f64::from(value));
    wrapper.append_child(&input)?;
    root.append_child(&wrapper)?;
    Ok(input)
}

fn button(document: &Document, root: &HtmlElement, text: &str) -> Result<HtmlButtonElement, JsValue> {
    let button: HtmlButtonElement = document.create_element("button")?.dyn_into()?;
    button.set_type("button");
    button.set_text_content(Some(text));
    root.append_child(&button)?;
    Ok(button)
}
