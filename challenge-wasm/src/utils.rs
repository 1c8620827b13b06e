use challenge_core::{BoundingBox, Point};
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;
use web_sys::{Element, MouseEvent, Window};

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Routes `log` records to the matching console method.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the console logger. Later calls only adjust the level.
pub fn init_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_err() {
        log("logger already installed");
    }
    log::set_max_level(level);
}

/// Client-space bounding box of an element.
pub fn element_box(el: &Element) -> BoundingBox {
    let rect = el.get_bounding_client_rect();
    BoundingBox::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Client coordinates of a mouse or pointer event.
pub fn client_point(e: &MouseEvent) -> Point {
    Point {
        x: e.client_x() as f64,
        y: e.client_y() as f64,
    }
}

/// The optional `window.__BASE_URL` set by the host page.
pub fn base_url(window: &Window) -> Option<String> {
    let v = js_sys::Reflect::get(window, &JsValue::from_str("__BASE_URL")).ok()?;
    v.as_string()
}

/// Join a resource path onto `base`. Absolute URLs pass through.
pub fn asset_url(base: Option<&str>, path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = base.unwrap_or("./");
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    let p = p.trim_start_matches('/');
    format!("{}{}", base, p)
}

/// `data:` URL for a base64 PNG payload.
pub fn png_data_url(b64: &str) -> String {
    format!("data:image/png;base64,{}", b64)
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .unwrap_or_else(|_| s.into())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_are_decoded() {
        let q = "?id=12&variant=hcaptcha&note=a%20b";
        assert_eq!(get_query_param(q, "id").as_deref(), Some("12"));
        assert_eq!(get_query_param(q, "note").as_deref(), Some("a b"));
        assert_eq!(get_query_param(q, "missing"), None);
    }

    #[test]
    fn asset_url_joins_base() {
        assert_eq!(asset_url(None, "challenge/3"), "./challenge/3");
        assert_eq!(asset_url(Some("/geetest/slide"), "/submit"), "/geetest/slide/submit");
        assert_eq!(asset_url(Some("/x/"), "https://h/submit"), "https://h/submit");
    }
}
