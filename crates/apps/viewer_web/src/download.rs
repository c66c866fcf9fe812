use capture::{Artifact, ArtifactSink, CaptureError};
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::maplibre::js_text;
use crate::recorder::BlobChunk;

/// Hands finished recordings to the browser as a file download.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDownload;

impl ArtifactSink for BrowserDownload {
    type Chunk = BlobChunk;

    fn deliver(&self, artifact: Artifact<BlobChunk>) -> Result<(), CaptureError> {
        let fail = |what: &str, e: Option<&wasm_bindgen::JsValue>| {
            CaptureError::Download(match e {
                Some(e) => format!("{what}: {}", js_text(e)),
                None => what.to_string(),
            })
        };

        let parts = js_sys::Array::new();
        for chunk in &artifact.chunks {
            parts.push(&chunk.0);
        }
        let options = BlobPropertyBag::new();
        options.set_type(artifact.mime);
        let blob = Blob::new_with_blob_sequence_and_options(&parts, &options)
            .map_err(|e| fail("unable to build blob", Some(&e)))?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|e| fail("unable to create download url", Some(&e)))?;

        let result = click_download(&url, &artifact.filename);
        Url::revoke_object_url(&url).ok();
        result.map_err(|what| fail(what, None))?;

        debug!(filename = %artifact.filename, size = blob.size(), "download triggered");
        Ok(())
    }
}

fn click_download(url: &str, filename: &str) -> Result<(), &'static str> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("document unavailable")?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(|_| "unable to create anchor")?
        .dyn_into()
        .map_err(|_| "anchor cast failed")?;
    anchor.set_href(url);
    anchor.set_download(filename);
    anchor.style().set_property("display", "none").ok();

    document
        .body()
        .ok_or("missing body")?
        .append_child(&anchor)
        .map_err(|_| "unable to attach anchor")?;
    anchor.click();
    anchor.remove();
    Ok(())
}
