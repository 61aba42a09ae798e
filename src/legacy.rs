//! Interface to readers of older, plugin-instance-specific preset formats.
//!
//! A legacy preset carries either an opaque state blob or an enumerated list
//! of normalized parameters.  The conversion path stores whichever it has in
//! the reserved `Comp` chunk.

use crate::params::Parameter;

pub trait LegacyPreset {
    /// Program name, for logging.
    fn name(&self) -> &str;

    /// The preset carries a raw opaque payload.
    fn is_opaque(&self) -> bool;

    /// The preset carries enumerated parameters.
    fn is_regular(&self) -> bool;

    /// Empty for opaque presets.
    fn parameters(&self) -> &[Parameter];

    /// `None` for regular presets.
    fn data(&self) -> Option<&[u8]>;
}
