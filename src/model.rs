//! Defines the core data structures and enums used in the slides viewer.
//!
//! This includes the weekday catalogue, slides decoded from the webhook,
//! the error state shown to the operator and the playback state driving
//! the viewer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// A day of the week, numbered from Sunday like the calendar the shop runs on.
///
/// Sunday is representable so "today" can always be computed, but it is
/// never offered as a selectable tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeekDay {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl WeekDay {
    /// All seven days, indexed by their number from Sunday.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Sunday,
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
    ];

    /// The days offered in the day selector (Monday to Saturday).
    pub const SELECTABLE: [WeekDay; 6] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
    ];

    /// Identifier sent to the webhook as the `day` query parameter.
    pub fn id(self) -> &'static str {
        match self {
            WeekDay::Sunday => "domingo",
            WeekDay::Monday => "segunda",
            WeekDay::Tuesday => "terca",
            WeekDay::Wednesday => "quarta",
            WeekDay::Thursday => "quinta",
            WeekDay::Friday => "sexta",
            WeekDay::Saturday => "sabado",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WeekDay::Sunday => "Domingo",
            WeekDay::Monday => "Segunda-feira",
            WeekDay::Tuesday => "Terça-feira",
            WeekDay::Wednesday => "Quarta-feira",
            WeekDay::Thursday => "Quinta-feira",
            WeekDay::Friday => "Sexta-feira",
            WeekDay::Saturday => "Sábado",
        }
    }

    /// RGB accent used for the day tile and the viewer header dot.
    pub fn accent(self) -> [u8; 3] {
        match self {
            WeekDay::Sunday => [0x6b, 0x72, 0x80],
            WeekDay::Monday => [0x3b, 0x82, 0xf6],
            WeekDay::Tuesday => [0x22, 0xc5, 0x5e],
            WeekDay::Wednesday => [0xea, 0xb3, 0x08],
            WeekDay::Thursday => [0xa8, 0x55, 0xf7],
            WeekDay::Friday => [0xef, 0x44, 0x44],
            WeekDay::Saturday => [0x63, 0x66, 0xf1],
        }
    }

    /// Calendar number of the day, 0 = Sunday .. 6 = Saturday.
    pub fn number_from_sunday(self) -> u32 {
        match self {
            WeekDay::Sunday => 0,
            WeekDay::Monday => 1,
            WeekDay::Tuesday => 2,
            WeekDay::Wednesday => 3,
            WeekDay::Thursday => 4,
            WeekDay::Friday => 5,
            WeekDay::Saturday => 6,
        }
    }

    /// Inverse of [`WeekDay::number_from_sunday`]; numbers wrap modulo 7.
    pub fn from_number(number: u32) -> WeekDay {
        WeekDay::ALL[(number % 7) as usize]
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single presentation slide, as published by the webhook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slide {
    /// Unique within one fetched batch.
    pub id: String,
    pub title: String,
    /// Location of the image or video shown for this slide.
    pub url: String,
    pub thumbnail: Option<String>,
}

/// Raw slide entry as it appears on the wire.
///
/// The deployed webhook names the title `titulo`; `title` is accepted too
/// and wins when both are present.
#[derive(Deserialize, Debug)]
struct WireSlide {
    id: String,
    #[serde(default, deserialize_with = "string_or_none")]
    title: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    titulo: Option<String>,
    url: String,
    #[serde(default, deserialize_with = "string_or_none")]
    thumbnail: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl Slide {
    /// Builds a slide from one element of the response array.
    ///
    /// Returns `None` unless `id`, a title and `url` are all strings.
    pub fn from_wire(value: Value) -> Option<Slide> {
        let wire: WireSlide = serde_json::from_value(value).ok()?;
        let title = wire.title.or(wire.titulo)?;
        Some(Slide {
            id: wire.id,
            title,
            url: wire.url,
            thumbnail: wire.thumbnail,
        })
    }
}

/// Category of the error currently shown to the operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Api,
    Iframe,
    #[default]
    General,
    NoContent,
}

/// The single error slot owned by the slides controller.
///
/// Replaced wholesale on every transition; an inactive state always carries
/// an empty message and [`ErrorKind::General`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorState {
    has_error: bool,
    message: String,
    kind: ErrorKind,
}

impl ErrorState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            message: message.into(),
            kind,
        }
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// A manual retry is offered for network errors only.
    pub fn can_retry(&self) -> bool {
        self.has_error && self.kind == ErrorKind::Network
    }
}

/// Where the slides controller stands for the selected day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlidesPhase {
    /// No day selected.
    Idle,
    /// Day selected, eligibility being checked.
    Gating,
    /// Eligible day, fetch in flight.
    Loading,
    /// Fetch finished; the slide list may be empty.
    Ready,
    /// The selected day is not today; nothing was fetched.
    Blocked,
    /// The fetch failed after any retries.
    Failed,
}

/// Playback state shared by the inline viewer and the fullscreen view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub is_fullscreen: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_index: 0,
            is_playing: true,
            is_fullscreen: false,
        }
    }
}
