/// Entity kinds the extractor is expected to produce. The set is open on the
/// write side: anything unrecognized resolves to `Generic` in `parse`, so
/// stored kinds are always drawn from this enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
	Person,
	Organization,
	Location,
	Concept,
	Event,
	Document,
	Generic,
}
impl EntityKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Person => "person",
			Self::Organization => "organization",
			Self::Location => "location",
			Self::Concept => "concept",
			Self::Event => "event",
			Self::Document => "document",
			Self::Generic => "generic",
		}
	}

	pub fn parse(value: &str) -> Self {
		match value.trim().to_lowercase().as_str() {
			"person" => Self::Person,
			"organization" | "organisation" | "company" => Self::Organization,
			"location" | "place" => Self::Location,
			"concept" => Self::Concept,
			"event" => Self::Event,
			"document" => Self::Document,
			_ => Self::Generic,
		}
	}
}

/// Relationship kinds. An extractor proposing anything outside this set is
/// mapped to `RelatedTo` by `parse`, once, at the write side; traversal never
/// branches on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
	Mentions,
	RelatedTo,
	PartOf,
	LocatedIn,
	WorksFor,
	MemberOf,
	SpouseOf,
	ChildOf,
	ParentOf,
	SiblingOf,
	Awarded,
	AppearsIn,
	StudiedAt,
	CreatedBy,
	FoundedBy,
	FounderOf,
	ExpertIn,
}
impl RelationKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Mentions => "MENTIONS",
			Self::RelatedTo => "RELATED_TO",
			Self::PartOf => "PART_OF",
			Self::LocatedIn => "LOCATED_IN",
			Self::WorksFor => "WORKS_FOR",
			Self::MemberOf => "MEMBER_OF",
			Self::SpouseOf => "SPOUSE_OF",
			Self::ChildOf => "CHILD_OF",
			Self::ParentOf => "PARENT_OF",
			Self::SiblingOf => "SIBLING_OF",
			Self::Awarded => "AWARDED",
			Self::AppearsIn => "APPEARS_IN",
			Self::StudiedAt => "STUDIED_AT",
			Self::CreatedBy => "CREATED_BY",
			Self::FoundedBy => "FOUNDED_BY",
			Self::FounderOf => "FOUNDER_OF",
			Self::ExpertIn => "EXPERT_IN",
		}
	}

	pub fn parse(value: &str) -> Self {
		let normalized: String = value
			.trim()
			.chars()
			.map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_uppercase() } else { '_' })
			.collect();

		match normalized.as_str() {
			"MENTIONS" => Self::Mentions,
			"RELATED_TO" => Self::RelatedTo,
			"PART_OF" => Self::PartOf,
			"LOCATED_IN" => Self::LocatedIn,
			"WORKS_FOR" | "EMPLOYED_BY" => Self::WorksFor,
			"MEMBER_OF" => Self::MemberOf,
			"SPOUSE_OF" => Self::SpouseOf,
			"CHILD_OF" => Self::ChildOf,
			"PARENT_OF" => Self::ParentOf,
			"SIBLING_OF" => Self::SiblingOf,
			"AWARDED" | "RECEIVED" | "WON" => Self::Awarded,
			"APPEARS_IN" => Self::AppearsIn,
			"STUDIED_AT" | "GRADUATED_FROM" => Self::StudiedAt,
			"CREATED_BY" | "AUTHORED_BY" => Self::CreatedBy,
			"FOUNDED_BY" => Self::FoundedBy,
			"FOUNDER_OF" => Self::FounderOf,
			"EXPERT_IN" | "SPECIALIZES_IN" => Self::ExpertIn,
			_ => Self::RelatedTo,
		}
	}
}
