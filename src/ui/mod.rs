//! Sitedeck desktop UI.
//!
//! Uses `wry` for cross-platform WebView rendering:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! The site rail and error page are HTML views; each tab is a child webview
//! implementing [`NavigableSurface`](crate::surface::NavigableSurface).

pub mod surface;
pub mod webview_app;
