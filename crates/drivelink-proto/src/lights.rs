//! Per-channel light effects.
//!
//! The vehicle drives six independently addressable LED channels. A light
//! pattern describes one effect on one channel and serializes to a fixed
//! 5-byte record `[channel, effect, start, end, cycles_per_10s]`. Up to
//! three records ride in a single `LIGHT_PATTERN` command.
//!
//! All bounded fields are validated when a pattern is constructed, never
//! at encode time: a built pattern always encodes. Changing a field means
//! building a new pattern.

use crate::error::{ProtoError, Result};

/// Highest accepted intensity for `start`/`end`/`brightness` fields.
pub const MAX_INTENSITY: u8 = 14;

/// Size of one encoded pattern record.
pub const PATTERN_RECORD_SIZE: usize = 5;

/// Addressable LED channels.
///
/// The two front lights have different colours and can be set
/// individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LightChannel {
    EngineRed = 0,
    Tail = 1,
    EngineBlue = 2,
    EngineGreen = 3,
    Front1 = 4,
    Front2 = 5,
}

/// Effect codes as the firmware expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Effect {
    Steady = 0,
    Fade = 1,
    Throb = 2,
    Flash = 3,
    Random = 4,
}

fn check_intensity(field: &'static str, value: u8) -> Result<()> {
    if value > MAX_INTENSITY {
        return Err(ProtoError::Validation {
            field,
            limit: MAX_INTENSITY,
            value,
        });
    }
    Ok(())
}

fn record(channel: LightChannel, effect: Effect, start: u8, end: u8, cycles_per_10s: u8) -> [u8; PATTERN_RECORD_SIZE] {
    [channel as u8, effect as u8, start, end, cycles_per_10s]
}

/// Hold a channel at a fixed intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteadyPattern {
    channel: LightChannel,
    brightness: u8,
}

impl SteadyPattern {
    /// `brightness` must be within `0..=MAX_INTENSITY`.
    pub fn new(channel: LightChannel, brightness: u8) -> Result<Self> {
        check_intensity("brightness", brightness)?;
        Ok(Self {
            channel,
            brightness,
        })
    }

    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        record(self.channel, Effect::Steady, self.brightness, 0, 0)
    }
}

/// Ramp a channel from `start` to `end` intensity once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadePattern {
    channel: LightChannel,
    start: u8,
    end: u8,
    cycles_per_10s: u8,
}

impl FadePattern {
    /// `start` and `end` must be within `0..=MAX_INTENSITY`.
    pub fn new(channel: LightChannel, start: u8, end: u8, cycles_per_10s: u8) -> Result<Self> {
        check_intensity("start", start)?;
        check_intensity("end", end)?;
        Ok(Self {
            channel,
            start,
            end,
            cycles_per_10s,
        })
    }

    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        record(self.channel, Effect::Fade, self.start, self.end, self.cycles_per_10s)
    }
}

/// Ramp a channel from `start` to `end` and back again each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrobPattern {
    channel: LightChannel,
    start: u8,
    end: u8,
    cycles_per_10s: u8,
}

impl ThrobPattern {
    /// `start` and `end` must be within `0..=MAX_INTENSITY`.
    pub fn new(channel: LightChannel, start: u8, end: u8, cycles_per_10s: u8) -> Result<Self> {
        check_intensity("start", start)?;
        check_intensity("end", end)?;
        Ok(Self {
            channel,
            start,
            end,
            cycles_per_10s,
        })
    }

    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        record(self.channel, Effect::Throb, self.start, self.end, self.cycles_per_10s)
    }
}

/// Switch a channel fully on between time markers `start` and `end`
/// within each cycle. Unlike the ramping effects, `start`/`end` are
/// points in time here, not intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPattern {
    channel: LightChannel,
    start: u8,
    end: u8,
    cycles_per_10s: u8,
}

impl FlashPattern {
    /// `start` and `end` must be within `0..=MAX_INTENSITY`.
    pub fn new(channel: LightChannel, start: u8, end: u8, cycles_per_10s: u8) -> Result<Self> {
        check_intensity("start", start)?;
        check_intensity("end", end)?;
        Ok(Self {
            channel,
            start,
            end,
            cycles_per_10s,
        })
    }

    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        record(self.channel, Effect::Flash, self.start, self.end, self.cycles_per_10s)
    }
}

/// Flash a channel erratically. Has no tunable fields; the start, end and
/// cycle bytes encode as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomPattern {
    channel: LightChannel,
}

impl RandomPattern {
    pub fn new(channel: LightChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        record(self.channel, Effect::Random, 0, 0, 0)
    }
}

/// Any light effect, ready to ride in a `LIGHT_PATTERN` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPattern {
    Steady(SteadyPattern),
    Fade(FadePattern),
    Throb(ThrobPattern),
    Flash(FlashPattern),
    Random(RandomPattern),
}

impl LightPattern {
    pub fn channel(&self) -> LightChannel {
        match self {
            LightPattern::Steady(p) => p.channel(),
            LightPattern::Fade(p) => p.channel(),
            LightPattern::Throb(p) => p.channel(),
            LightPattern::Flash(p) => p.channel(),
            LightPattern::Random(p) => p.channel(),
        }
    }

    /// Serialize to the fixed 5-byte wire record.
    pub fn encode(&self) -> [u8; PATTERN_RECORD_SIZE] {
        match self {
            LightPattern::Steady(p) => p.encode(),
            LightPattern::Fade(p) => p.encode(),
            LightPattern::Throb(p) => p.encode(),
            LightPattern::Flash(p) => p.encode(),
            LightPattern::Random(p) => p.encode(),
        }
    }
}

impl From<SteadyPattern> for LightPattern {
    fn from(p: SteadyPattern) -> Self {
        LightPattern::Steady(p)
    }
}

impl From<FadePattern> for LightPattern {
    fn from(p: FadePattern) -> Self {
        LightPattern::Fade(p)
    }
}

impl From<ThrobPattern> for LightPattern {
    fn from(p: ThrobPattern) -> Self {
        LightPattern::Throb(p)
    }
}

impl From<FlashPattern> for LightPattern {
    fn from(p: FlashPattern) -> Self {
        LightPattern::Flash(p)
    }
}

impl From<RandomPattern> for LightPattern {
    fn from(p: RandomPattern) -> Self {
        LightPattern::Random(p)
    }
}
