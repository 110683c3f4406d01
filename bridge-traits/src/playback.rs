//! Playback surface bridge.
//!
//! The playback surface is the host's native media element: it is handed a
//! URL-like reference to playable bytes, tries to render it, and raises a
//! single asynchronous error signal when it cannot. The core never decodes for
//! the surface directly; it only hands it new references after repairing or
//! transcoding the source.
//!
//! Hosts are expected to provide one implementation per platform (an
//! `HTMLAudioElement` plus object URLs on the web, a native player elsewhere).
//! The error signal is delivered by the host calling back into the core's
//! fallback orchestrator; it is never polled.

use crate::{error::Result, platform::PlatformSendSync};
use bytes::Bytes;
use std::fmt;

/// Opaque reference to playable bytes, as minted by a [`PlaybackSurface`].
///
/// On the web this is a `blob:` object URL; other hosts may use file paths or
/// handles encoded as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUrl(String);

impl ResourceUrl {
    /// Wrap a host-provided reference.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Borrow the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceUrl {
    fn from(url: String) -> Self {
        Self(url)
    }
}

/// Host media element capable of rendering a referenced byte buffer.
///
/// Every successful [`create_resource`](PlaybackSurface::create_resource) must
/// eventually be matched by exactly one
/// [`release_resource`](PlaybackSurface::release_resource) for the same URL.
/// The core upholds this through a scoped guard, so implementations may treat
/// an unbalanced release as a bug.
pub trait PlaybackSurface: PlatformSendSync {
    /// Register `data` as a playable resource with the declared media type and
    /// return a reference to it (acquire).
    fn create_resource(&self, data: Bytes, media_type: &str) -> Result<ResourceUrl>;

    /// Drop a previously created resource (release). Must not fail; hosts that
    /// cannot release should log and move on.
    fn release_resource(&self, url: &ResourceUrl);

    /// Point the media element at `url` and start loading it. A failure to
    /// render is reported later through the asynchronous error signal, not
    /// through this return value.
    fn load(&self, url: &ResourceUrl) -> Result<()>;

    /// Halt any in-flight playback.
    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_round_trips_through_display() {
        let url = ResourceUrl::new("blob:https://host/1234");
        assert_eq!(url.as_str(), "blob:https://host/1234");
        assert_eq!(url.to_string(), "blob:https://host/1234");
        assert_eq!(ResourceUrl::from("blob:x".to_string()), ResourceUrl::new("blob:x"));
    }
}
