//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK] ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR] ");
pub static STOP: Emoji<'_, '_> = Emoji("⏹️  ", "[STOP] ");
pub static RESTART: Emoji<'_, '_> = Emoji("🔄 ", "[RETRY] ");

// Review indicators
pub static ISSUE: Emoji<'_, '_> = Emoji("🔖 ", "#");
