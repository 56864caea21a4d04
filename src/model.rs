use std::fmt;
use std::ops::{Index, IndexMut};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Name recorded in the ayes list of a unanimous motion.
pub const UNANIMOUS_MARKER: &str = "UNANIMOUS";

/// Member name used for the single exploded row of a unanimous motion.
pub const ALL_PRESENT: &str = "ALL_PRESENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteType {
    Ayes,
    Noes,
    Abstentions,
    Recused,
    Excused,
    NonVoting,
}

impl VoteType {
    pub const ALL: [VoteType; 6] = [
        VoteType::Ayes,
        VoteType::Noes,
        VoteType::Abstentions,
        VoteType::Recused,
        VoteType::Excused,
        VoteType::NonVoting,
    ];

    /// Label as printed in the minutes, without the trailing colon.
    pub fn label(self) -> &'static str {
        match self {
            VoteType::Ayes => "Ayes",
            VoteType::Noes => "Noes",
            VoteType::Abstentions => "Abstentions",
            VoteType::Recused => "Recused",
            VoteType::Excused => "Excused",
            VoteType::NonVoting => "Non Voting",
        }
    }

    /// Parse a captured label. Whitespace inside "Non Voting" is not significant.
    pub fn from_label(label: &str) -> Option<VoteType> {
        let squashed: String = label.split_whitespace().collect::<Vec<_>>().join(" ");
        VoteType::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(&squashed))
    }

    pub fn tag(self) -> VoteTag {
        match self {
            VoteType::Ayes => VoteTag::Aye,
            VoteType::Noes => VoteTag::No,
            VoteType::Abstentions => VoteTag::Abstain,
            VoteType::Recused => VoteTag::Recused,
            VoteType::Excused => VoteTag::Excused,
            VoteType::NonVoting => VoteTag::NonVoting,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for VoteType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Vote-type tag carried by an exploded per-member row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteTag {
    Aye,
    No,
    Abstain,
    Excused,
    Recused,
    NonVoting,
    UnanimousAye,
}

impl VoteTag {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteTag::Aye => "AYE",
            VoteTag::No => "NO",
            VoteTag::Abstain => "ABSTAIN",
            VoteTag::Excused => "EXCUSED",
            VoteTag::Recused => "RECUSED",
            VoteTag::NonVoting => "NON_VOTING",
            VoteTag::UnanimousAye => "UNANIMOUS_AYE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionKind {
    #[serde(rename = "Main Motion")]
    MainMotion,
    Amendment,
    Adopt,
    #[serde(rename = "Call the Question")]
    CallTheQuestion,
    Refer,
    Adjourn,
}

impl MotionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MotionKind::MainMotion => "Main Motion",
            MotionKind::Amendment => "Amendment",
            MotionKind::Adopt => "Adopt",
            MotionKind::CallTheQuestion => "Call the Question",
            MotionKind::Refer => "Refer",
            MotionKind::Adjourn => "Adjourn",
        }
    }
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared size of one vote-type tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Declared(u32),
    /// Unanimous vote; members are not individually tracked.
    Unanimous,
}

impl Count {
    /// Numeric form used in tabular outputs; unanimous is `-1`.
    pub fn value(self) -> i64 {
        match self {
            Count::Declared(n) => i64::from(n),
            Count::Unanimous => -1,
        }
    }
}

impl Default for Count {
    fn default() -> Self {
        Count::Declared(0)
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub count: Count,
    pub names: Vec<String>,
}

impl Tally {
    pub fn is_empty(&self) -> bool {
        self.count == Count::Declared(0) && self.names.is_empty()
    }
}

/// The six (count, names) pairs of a motion, indexed by [`VoteType`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tallies([Tally; 6]);

impl Tallies {
    pub fn iter(&self) -> impl Iterator<Item = (VoteType, &Tally)> {
        VoteType::ALL.into_iter().zip(self.0.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Tally::is_empty)
    }

    /// Sum of declared counts, ignoring the unanimous sentinel.
    pub fn declared_total(&self) -> i64 {
        self.0
            .iter()
            .map(|t| match t.count {
                Count::Declared(n) => i64::from(n),
                Count::Unanimous => 0,
            })
            .sum()
    }
}

impl Index<VoteType> for Tallies {
    type Output = Tally;

    fn index(&self, vote: VoteType) -> &Tally {
        &self.0[vote.index()]
    }
}

impl IndexMut<VoteType> for Tallies {
    fn index_mut(&mut self, vote: VoteType) -> &mut Tally {
        &mut self.0[vote.index()]
    }
}

impl Serialize for Tallies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        for (vote, tally) in self.iter() {
            map.serialize_entry(vote.label(), tally)?;
        }
        map.end()
    }
}

/// One motion's outcome. Built once by the record builder and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteRecord {
    pub item_number: String,
    pub motion_number: u32,
    pub motion_title: String,
    pub motion_kind: MotionKind,
    pub legistar_number: String,
    pub legistar_link: String,
    pub description: String,
    pub mover: Option<String>,
    pub seconder: Option<String>,
    pub is_unanimous: bool,
    pub tallies: Tallies,
    pub page_number: usize,
}

impl VoteRecord {
    pub fn tally(&self, vote: VoteType) -> &Tally {
        &self.tallies[vote]
    }
}
