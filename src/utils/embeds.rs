use serenity::all::CreateEmbed;

/// Colors used across all bot embeds.
pub struct Colors;

impl Colors {
    pub const SUCCESS: u32 = 0x43B581;
    pub const ERROR: u32 = 0xA90F25;
    pub const WARNING: u32 = 0xF3DD6C;
    pub const INFO: u32 = 0x5865F2;
    pub const MODERATION: u32 = 0x8B0A1E;
    pub const PROTECTION: u32 = 0xE67E22;
    pub const GIVEAWAY: u32 = 0x00CED1;
}

/// Create a success-themed embed (green) with a check-marked description.
pub fn success_embed(description: impl Into<String>) -> CreateEmbed {
    base_embed(Colors::SUCCESS).description(description)
}

/// Create an error-themed embed (red).
pub fn error_embed(description: impl Into<String>) -> CreateEmbed {
    base_embed(Colors::ERROR).description(description)
}

/// Create a warning-themed embed (gold).
pub fn warning_embed(description: impl Into<String>) -> CreateEmbed {
    base_embed(Colors::WARNING).description(description)
}

/// Create an info-themed embed (blurple).
pub fn info_embed() -> CreateEmbed {
    base_embed(Colors::INFO)
}

/// Create a moderation-themed embed (dark red), used for case logs.
pub fn moderation_embed() -> CreateEmbed {
    base_embed(Colors::MODERATION)
}

/// Create a protection-themed embed (orange), used for anti-nuke/anti-raid alerts.
pub fn protection_embed() -> CreateEmbed {
    base_embed(Colors::PROTECTION)
}

/// Create a giveaway-themed embed (teal).
pub fn giveaway_embed() -> CreateEmbed {
    base_embed(Colors::GIVEAWAY)
}

fn base_embed(color: u32) -> CreateEmbed {
    CreateEmbed::default()
        .color(color)
        .timestamp(serenity::model::Timestamp::now())
}
