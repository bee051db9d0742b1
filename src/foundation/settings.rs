use crate::foundation::error::{InsetError, InsetResult};

/// How wide the margin around a scratch surface is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// `max(width, height)` of the visible surface, recomputed per draw.
    #[default]
    Auto,
    /// A fixed margin in pixels.
    Fixed(u32),
}

impl BufferPolicy {
    /// Margin for a visible surface of the given size.
    pub fn resolve(self, width: u32, height: u32) -> u32 {
        match self {
            Self::Auto => width.max(height),
            Self::Fixed(px) => px,
        }
    }

    /// Margin on a host whose surfaces are at most `max_side` pixels on a side. `Auto`
    /// shrinks so the scratch surface still fits; `Fixed` is used as given.
    pub fn resolve_within(self, width: u32, height: u32, max_side: Option<u32>) -> u32 {
        let buffer = self.resolve(width, height);
        match (self, max_side) {
            (Self::Auto, Some(max)) => buffer.min(max.saturating_sub(width.max(height)) / 2),
            _ => buffer,
        }
    }
}

/// Options for an [`InsetCanvas`](crate::InsetCanvas).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InsetSettings {
    /// Initial inset-mode flag.
    pub inset: bool,
    /// Scratch margin policy.
    pub buffer: BufferPolicy,
}

impl InsetSettings {
    /// Defaults overridden by `INSET_BUFFER_PX` and `INSET_DEFAULT`.
    pub fn from_env() -> InsetResult<Self> {
        Self::default().apply_env()
    }

    /// `self` with any `INSET_BUFFER_PX` / `INSET_DEFAULT` values applied on top.
    pub fn apply_env(self) -> InsetResult<Self> {
        let buffer_px = std::env::var("INSET_BUFFER_PX").ok();
        let inset = std::env::var("INSET_DEFAULT").ok();
        self.with_overrides(buffer_px.as_deref(), inset.as_deref())
    }

    fn with_overrides(mut self, buffer_px: Option<&str>, inset: Option<&str>) -> InsetResult<Self> {
        if let Some(v) = buffer_px {
            let px = v.trim().parse::<u32>().map_err(|_| {
                InsetError::validation(format!("INSET_BUFFER_PX must be a pixel count, got '{v}'"))
            })?;
            self.buffer = BufferPolicy::Fixed(px);
        }
        if let Some(v) = inset {
            self.inset = match v.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" | "" => false,
                other => {
                    return Err(InsetError::validation(format!(
                        "INSET_DEFAULT must be a boolean, got '{other}'"
                    )));
                }
            };
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/settings.rs"]
mod tests;
