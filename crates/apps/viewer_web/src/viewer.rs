use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use capture::{CaptureController, Transport};
use foundation::DateSequence;
use runtime::{DAY_BOUNDS, FPS_BOUNDS};
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::ViewerConfig;
use crate::controls::{ControlAction, Controls, ensure_element};
use crate::download::BrowserDownload;
use crate::logging;
use crate::maplibre::BrowserMap;
use crate::recorder::CanvasEncoder;
use crate::timer::BrowserTimer;

// Guard against mounting twice (hot reload, repeated script tags).
static INITIALIZED: AtomicBool = AtomicBool::new(false);

type ViewerTransport = Transport<BrowserMap, BrowserTimer, CanvasEncoder, BrowserDownload>;

struct App {
    transport: ViewerTransport,
    map: BrowserMap,
    controls: Rc<Controls>,
}

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = const { RefCell::new(None) };
}

/// The mounted viewer, if any. `None` during teardown instead of panicking.
fn current() -> Option<Rc<App>> {
    APP.try_with(|app| app.borrow().clone()).ok().flatten()
}

fn with_app<F, R>(f: F) -> R
where
    F: FnOnce(&App) -> R,
    R: Default,
{
    current().map(|app| f(&app)).unwrap_or_default()
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Create the map and the controls. Calling it again while mounted is a no-op.
#[wasm_bindgen]
pub fn mount() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("viewer already mounted");
        return Ok(());
    }
    match build_app() {
        Ok(app) => {
            let _ = APP.try_with(|slot| *slot.borrow_mut() = Some(app));
            Ok(())
        }
        Err(err) => {
            INITIALIZED.store(false, Ordering::SeqCst);
            error!(error = ?err, "viewer failed to mount");
            Err(err)
        }
    }
}

fn build_app() -> Result<Rc<App>, JsValue> {
    let (config, config_err) = match ViewerConfig::from_window() {
        Ok(config) => (config, None),
        Err(err) => (ViewerConfig::default(), Some(err)),
    };
    logging::init(config.max_log_level());
    if let Some(err) = config_err {
        warn!(%err, "page config ignored, using defaults");
    }

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let (container, created) = ensure_element(&document, &config.container_id)?;
    if created {
        let style = container.style();
        style.set_property("width", "100%")?;
        style.set_property("height", "70vh")?;
    }

    let settings = config.transport_settings();
    let newest = DateSequence::last_days(settings.days, settings.embargo_days).last();
    let map = BrowserMap::create(&config, newest)?;

    let capture = CaptureController::new(
        CanvasEncoder::new(map.clone(), config.recorder_timeslice_ms),
        BrowserDownload,
    )
    .with_filename_prefix(config.filename_prefix.clone());
    let transport = Transport::new(map.clone(), BrowserTimer, capture, settings);

    let controls = match Controls::mount(
        &document,
        &config.controls_id,
        transport.settings(),
        Rc::new(dispatch),
    ) {
        Ok(controls) => Rc::new(controls),
        Err(err) => {
            map.destroy();
            return Err(err);
        }
    };
    let render_to = Rc::clone(&controls);
    transport.set_listener(Box::new(move |snapshot| render_to.render(snapshot)));

    let applied = transport.settings();
    info!(
        days = applied.days,
        fps = applied.fps,
        idle_timeout_ms = applied.idle_timeout.as_millis() as u64,
        "viewer mounted"
    );
    Ok(Rc::new(App {
        transport,
        map,
        controls,
    }))
}

fn dispatch(action: ControlAction) {
    match action {
        ControlAction::Preview => preview(),
        ControlAction::Record => record(),
        ControlAction::Stop => {
            stop();
        }
        ControlAction::Days(days) => {
            set_days(days);
        }
        ControlAction::Fps(fps) => {
            set_fps(fps);
        }
    }
}

/// Play the date sequence on the map.
#[wasm_bindgen]
pub fn preview() {
    let Some(app) = current() else {
        warn!("preview requested before mount");
        return;
    };
    spawn_local(async move {
        if let Some(report) = app.transport.preview().await {
            info!(
                frames = report.frames,
                skipped = report.skipped,
                idle_timeouts = report.idle_timeouts,
                cancelled = report.cancelled,
                "preview finished"
            );
        }
    });
}

/// Play the date sequence while recording the canvas, then download the video.
#[wasm_bindgen]
pub fn record() {
    let Some(app) = current() else {
        warn!("record requested before mount");
        return;
    };
    spawn_local(async move {
        match app.transport.record().await {
            Ok(Some(summary)) => info!(
                filename = %summary.filename,
                bytes = summary.bytes,
                "recording saved"
            ),
            Ok(None) => debug!("record ignored"),
            Err(err) => error!(%err, "recording failed"),
        }
    });
}

/// Cancel the running preview or recording. Returns whether one was running.
#[wasm_bindgen]
pub fn stop() -> bool {
    with_app(|app| app.transport.stop())
}

/// Apply a day count and return the clamped value actually used.
#[wasm_bindgen]
pub fn set_days(days: u32) -> u32 {
    current()
        .map(|app| {
            let applied = app.transport.set_days(days);
            app.controls
                .set_values(applied, app.transport.settings().fps);
            applied
        })
        .unwrap_or_else(|| DAY_BOUNDS.clamp(days))
}

/// Apply a frame rate and return the clamped value actually used.
#[wasm_bindgen]
pub fn set_fps(fps: u32) -> u32 {
    current()
        .map(|app| {
            let applied = app.transport.set_fps(fps);
            app.controls
                .set_values(app.transport.settings().days, applied);
            applied
        })
        .unwrap_or_else(|| FPS_BOUNDS.clamp(fps))
}

#[wasm_bindgen]
pub fn status() -> String {
    with_app(|app| app.transport.snapshot().status)
}

/// Stop everything, remove the controls and the map.
#[wasm_bindgen]
pub fn dispose() {
    let Some(app) = APP.try_with(|slot| slot.borrow_mut().take()).ok().flatten() else {
        return;
    };
    app.transport.stop();
    app.transport.clear_listener();
    app.controls.detach();
    app.map.destroy();
    INITIALIZED.store(false, Ordering::SeqCst);
    info!("viewer disposed");
}
