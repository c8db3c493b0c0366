use serde::{Deserialize, Serialize};

/// Source modality of an ingested chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
	#[default]
	Text,
	Image,
	Audio,
	Video,
}
impl Modality {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Image => "image",
			Self::Audio => "audio",
			Self::Video => "video",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		match value.trim().to_lowercase().as_str() {
			"text" => Some(Self::Text),
			"image" => Some(Self::Image),
			"audio" => Some(Self::Audio),
			"video" => Some(Self::Video),
			_ => None,
		}
	}
}
