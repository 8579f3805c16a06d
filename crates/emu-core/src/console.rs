//! Whole-system runtime trait.

/// A fully assembled emulated console.
///
/// The console owns all emulated state (CPU, video, cartridge). A driver
/// resets it once, then calls [`step`](Console::step) repeatedly and sums
/// the returned cycle counts.
pub trait Console {
    /// Fatal failure raised while stepping.
    type Error: std::error::Error + 'static;

    /// Put the console into its power-on state.
    fn reset(&mut self);

    /// Advance exactly one scheduling quantum.
    ///
    /// Returns the number of CPU cycles that elapsed, always at least 1.
    /// Never blocks.
    fn step(&mut self) -> Result<u32, Self::Error>;
}
