//! Hand-off to the operating system's default browser.

use crate::platform;
use crate::types::errors::OpenError;

pub trait ExternalOpener {
    fn open(&self, url: &str) -> Result<(), OpenError>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        let parsed = url::Url::parse(url).map_err(|_| OpenError::InvalidUrl(url.to_string()))?;
        platform::open_url(parsed.as_str())
    }
}
