use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use foundation::{CalendarDate, LngLat};
use futures::channel::oneshot;
use layers::{MapHost, MapSurface, RasterBinding, RasterLayer, RasterSourceSpec, SurfaceError};
use serde::Serialize;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::config::ViewerConfig;

#[wasm_bindgen(js_namespace = maplibregl)]
extern "C" {
    /// `maplibregl.Map` from MapLibre GL JS, loaded by the page.
    #[wasm_bindgen(js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MapLibreMap;

    #[wasm_bindgen(constructor, js_class = "Map", catch)]
    fn new(options: &JsValue) -> Result<MapLibreMap, JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &MapLibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &MapLibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = addSource, catch)]
    fn add_source(this: &MapLibreMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = addLayer, catch)]
    fn add_layer(this: &MapLibreMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = removeLayer, catch)]
    fn remove_layer(this: &MapLibreMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = removeSource, catch)]
    fn remove_source(this: &MapLibreMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn off(this: &MapLibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = getCanvas)]
    fn get_canvas(this: &MapLibreMap) -> HtmlCanvasElement;

    #[wasm_bindgen(method)]
    fn remove(this: &MapLibreMap);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions<'a> {
    container: &'a str,
    center: LngLat,
    zoom: f64,
    /// Keeps the last frame readable by `captureStream`.
    preserve_drawing_buffer: bool,
    style: StyleSpec<'a>,
}

#[derive(Serialize)]
struct StyleSpec<'a> {
    version: u8,
    glyphs: &'a str,
    sources: serde_json::Map<String, serde_json::Value>,
    layers: Vec<serde_json::Value>,
}

/// Serialize through JSON; map styles are plain data.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let raw = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&raw)
}

pub(crate) fn js_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn is_present(value: &JsValue) -> bool {
    !(value.is_undefined() || value.is_null())
}

/// [`MapSurface`] over a live MapLibre style.
///
/// Readiness is the map's `load` event, not `isStyleLoaded()`: the latter
/// turns false whenever tiles are in flight.
struct StyleSurface<'a> {
    map: &'a MapLibreMap,
    loaded: bool,
}

impl MapSurface for StyleSurface<'_> {
    fn is_style_ready(&self) -> bool {
        self.loaded
    }

    fn has_source(&self, id: &str) -> bool {
        is_present(&self.map.get_source(id))
    }

    fn has_layer(&self, id: &str) -> bool {
        is_present(&self.map.get_layer(id))
    }

    fn add_raster_source(
        &mut self,
        id: &str,
        source: &RasterSourceSpec,
    ) -> Result<(), SurfaceError> {
        let rejected = |message: String| SurfaceError::Rejected {
            op: "addSource",
            id: id.to_string(),
            message,
        };
        let spec = to_js(source).map_err(|e| rejected(js_text(&e)))?;
        self.map
            .add_source(id, &spec)
            .map_err(|e| rejected(js_text(&e)))
    }

    fn add_layer(&mut self, layer: &RasterLayer) -> Result<(), SurfaceError> {
        let rejected = |message: String| SurfaceError::Rejected {
            op: "addLayer",
            id: layer.id.clone(),
            message,
        };
        let spec = to_js(layer).map_err(|e| rejected(js_text(&e)))?;
        self.map.add_layer(&spec).map_err(|e| rejected(js_text(&e)))
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.map
            .remove_layer(id)
            .map_err(|e| SurfaceError::Rejected {
                op: "removeLayer",
                id: id.to_string(),
                message: js_text(&e),
            })
    }

    fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        self.map
            .remove_source(id)
            .map_err(|e| SurfaceError::Rejected {
                op: "removeSource",
                id: id.to_string(),
                message: js_text(&e),
            })
    }
}

struct Inner {
    map: RefCell<Option<MapLibreMap>>,
    binding: RefCell<RasterBinding>,
    /// Set once by the `load` listener.
    loaded: Cell<bool>,
    on_load: RefCell<Option<Closure<dyn FnMut()>>>,
}

/// The page's single MapLibre map plus its imagery binding.
///
/// Cloning shares the same map.
#[derive(Clone)]
pub struct BrowserMap {
    inner: Rc<Inner>,
}

impl BrowserMap {
    /// Create the map in the configured container and show `first_date` as
    /// soon as the style has loaded.
    pub fn create(config: &ViewerConfig, first_date: Option<CalendarDate>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let has_library = js_sys::Reflect::has(&window, &JsValue::from_str("maplibregl"))?;
        if !has_library {
            return Err(JsValue::from_str("maplibregl is not loaded"));
        }

        let options = MapOptions {
            container: &config.container_id,
            center: config.center,
            zoom: config.zoom,
            preserve_drawing_buffer: true,
            style: StyleSpec {
                version: 8,
                glyphs: &config.glyphs,
                sources: serde_json::Map::new(),
                layers: vec![serde_json::json!({
                    "id": "background",
                    "type": "background",
                    "paint": { "background-color": "#000000" }
                })],
            },
        };
        let map = MapLibreMap::new(&to_js(&options)?)?;

        let inner = Rc::new(Inner {
            map: RefCell::new(Some(map.clone())),
            binding: RefCell::new(RasterBinding::new(config.tile_source())),
            loaded: Cell::new(false),
            on_load: RefCell::new(None),
        });

        let weak: Weak<Inner> = Rc::downgrade(&inner);
        let on_load = Closure::<dyn FnMut()>::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            info!("map style loaded");
            inner.loaded.set(true);
            if let Some(date) = first_date {
                BrowserMap { inner }.show_date(date);
            }
        });
        map.on("load", on_load.as_ref().unchecked_ref());
        *inner.on_load.borrow_mut() = Some(on_load);

        info!(
            container = %config.container_id,
            lng = config.center.lng,
            lat = config.center.lat,
            zoom = config.zoom,
            "map created"
        );
        Ok(Self { inner })
    }

    /// The map's drawing surface, while the map exists.
    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.inner.map.borrow().as_ref().map(MapLibreMap::get_canvas)
    }

    /// Tear the map down. Further calls are no-ops.
    pub fn destroy(&self) {
        let Some(map) = self.inner.map.borrow_mut().take() else {
            return;
        };
        self.inner.loaded.set(false);
        if let Some(on_load) = self.inner.on_load.borrow_mut().take() {
            map.off("load", on_load.as_ref().unchecked_ref());
        }
        map.remove();
        info!("map removed");
    }
}

impl MapHost for BrowserMap {
    fn is_ready(&self) -> bool {
        self.inner.map.borrow().is_some() && self.inner.loaded.get()
    }

    fn show_date(&self, date: CalendarDate) -> bool {
        let map = self.inner.map.borrow();
        let Some(map) = map.as_ref() else {
            debug!(%date, "no map, skipping imagery swap");
            return false;
        };
        let mut surface = StyleSurface {
            map,
            loaded: self.inner.loaded.get(),
        };
        match self.inner.binding.borrow_mut().set_date(&mut surface, date) {
            Ok(bound) => bound,
            Err(err) => {
                warn!(%date, %err, "imagery swap failed");
                false
            }
        }
    }

    fn idle(&self) -> impl Future<Output = ()> {
        match self.inner.map.borrow().as_ref() {
            Some(map) => IdleWait::register(map),
            None => IdleWait::detached(),
        }
    }
}

/// One-shot subscription to the map's `idle` event.
///
/// Dropping it unregisters the listener, so a race lost to the timeout does
/// not leave handlers behind.
struct IdleWait {
    map: Option<MapLibreMap>,
    listener: Option<Closure<dyn FnMut()>>,
    rx: Option<oneshot::Receiver<()>>,
}

impl IdleWait {
    fn register(map: &MapLibreMap) -> Self {
        let (tx, rx) = oneshot::channel();
        let mut tx = Some(tx);
        let listener = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        });
        map.on("idle", listener.as_ref().unchecked_ref());
        Self {
            map: Some(map.clone()),
            listener: Some(listener),
            rx: Some(rx),
        }
    }

    /// Never resolves; the caller's timeout decides.
    fn detached() -> Self {
        Self {
            map: None,
            listener: None,
            rx: None,
        }
    }
}

impl Future for IdleWait {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.rx.as_mut() {
            Some(rx) => Pin::new(rx).poll(cx).map(|_| ()),
            None => Poll::Pending,
        }
    }
}

impl Drop for IdleWait {
    fn drop(&mut self) {
        if let (Some(map), Some(listener)) = (&self.map, &self.listener) {
            map.off("idle", listener.as_ref().unchecked_ref());
        }
    }
}
