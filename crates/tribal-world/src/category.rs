//! Category resolution for connecting identities.
//!
//! The real category of a person (their character's gender) may come from
//! the host, through a [`CategorySource`]. When the host cannot tell, the
//! category is drawn from a seeded pseudo-random mix of `(salt, id)`.
//!
//! # Determinism
//!
//! [`CategoryDraw`] uses a `xorshift64` step over the salt and identity.
//! The same salt and identity always produce the same category, in any
//! process and at any time; the draw never reads the clock or any shared
//! generator state.

use tribal_types::{Category, PersonId};

/// Salt used when none is configured.
pub const DEFAULT_CATEGORY_SALT: u64 = 0x10EC;

/// An external lookup of a person's category.
///
/// Implementations typically ask the host for the avatar of the connecting
/// client. Returning `None` means "unknown" and makes the caller fall back
/// to [`CategoryDraw`].
pub trait CategorySource: Send + Sync {
    /// Look up the category of `id`, if the host knows it.
    fn category_of(&self, id: PersonId) -> Option<Category>;
}

/// A source that never knows anything. Every identity falls back to the draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCategorySource;

impl CategorySource for NoCategorySource {
    fn category_of(&self, _id: PersonId) -> Option<Category> {
        None
    }
}

/// A source that reports the same category for everyone.
#[derive(Debug, Clone, Copy)]
pub struct FixedCategory(pub Category);

impl CategorySource for FixedCategory {
    fn category_of(&self, _id: PersonId) -> Option<Category> {
        Some(self.0)
    }
}

/// Deterministic fallback draw keyed by `(salt, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDraw {
    salt: u64,
}

impl CategoryDraw {
    /// Create a draw with the given salt.
    pub const fn new(salt: u64) -> Self {
        Self { salt }
    }

    /// The configured salt.
    pub const fn salt(&self) -> u64 {
        self.salt
    }

    /// Draw the category for `id`.
    pub fn draw(&self, id: PersonId) -> Category {
        let len = u64::try_from(Category::ALL.len()).unwrap_or(1);
        let roll = deterministic_random(self.salt, id.into_inner())
            .checked_rem(len)
            .unwrap_or(0);
        let index = usize::try_from(roll).unwrap_or(0);
        Category::ALL.get(index).copied().unwrap_or(Category::Male)
    }

    /// Resolve the category for `id`: the source's answer if it has one,
    /// otherwise the draw.
    pub fn resolve(&self, source: &dyn CategorySource, id: PersonId) -> Category {
        source.category_of(id).unwrap_or_else(|| self.draw(id))
    }
}

impl Default for CategoryDraw {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_SALT)
    }
}

/// `xorshift64` over a mix of salt and identity.
const fn deterministic_random(salt: u64, id: u64) -> u64 {
    // 0x517cc1b727220a95 is a well-known mixing constant.
    let mut state = salt.wrapping_add(id.wrapping_mul(0x517c_c1b7_2722_0a95));

    // xorshift requires a non-zero state.
    if state == 0 {
        state = 0xdead_beef_cafe_babe;
    }

    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;

    state
}
