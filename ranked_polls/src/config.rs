// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The number of preference slots on a ballot.
pub const MAX_RANKS: usize = 3;

/// One choosable item in a poll.
///
/// Options are identified by their position in the option list handed to
/// [`RankedPoll::new`](crate::RankedPoll::new). Positions are stable for the
/// lifetime of the poll.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct PollOption {
    pub text: String,
    /// An option under the supermajority rule: it must gather at least two
    /// thirds of the votes cast in a round to stay eligible for the winner
    /// tier.
    pub is_two_thirds: bool,
}

impl PollOption {
    pub fn new(text: &str) -> PollOption {
        PollOption {
            text: text.to_string(),
            is_two_thirds: false,
        }
    }

    pub fn new_two_thirds(text: &str) -> PollOption {
        PollOption {
            text: text.to_string(),
            is_two_thirds: true,
        }
    }

    /// The label shown to voters. Two-thirds options carry an annotation.
    pub fn display_label(&self) -> String {
        if self.is_two_thirds {
            format!("{} (2/3ds)", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// One voter's ranked choices: a sparse mapping from rank slot to option
/// index.
///
/// A ballot holds at most one option per slot and never the same option in
/// two slots. Ballots are created and updated through
/// [`RankedPoll::cast`](crate::RankedPoll::cast), which upholds both
/// invariants.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Ballot {
    pub(crate) ranks: [Option<usize>; MAX_RANKS],
}

impl Ballot {
    /// The option index sitting at the given rank slot, if any.
    pub fn rank(&self, rank: usize) -> Option<usize> {
        self.ranks.get(rank).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.iter().all(|slot| slot.is_none())
    }
}

// ******** Output data structures *********

/// Final standing of a single option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTally {
    /// Position of the option in the poll's option list.
    pub index: usize,
    /// The highest first-active-preference count the option reached in any
    /// round.
    pub votes: u64,
    /// How often the option was ranked first, second and third across all
    /// ballots, independent of eliminations.
    pub rank_distribution: [u64; MAX_RANKS],
    /// Display intensity in `[0.2, 1.0]`: the option's peak count relative
    /// to the best peak count in the poll.
    pub opacity: f64,
}

/// A display-ready view of one poll.
///
/// The obscured form keeps the option list but withholds results and
/// ballots, for polls whose outcome must stay hidden until they close.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    /// Display labels in option order, two-thirds options annotated.
    pub labels: Vec<String>,
    /// The raw option records.
    pub options: Vec<PollOption>,
    /// Ordered results, winner first. `None` when the snapshot is obscured.
    pub results: Option<Vec<OptionTally>>,
    /// The stored ballots. `None` when the snapshot is obscured.
    pub ballots: Option<Vec<Ballot>>,
}

// ********* Errors **********

/// Rejected `cast` calls. The ballot store is left untouched when any of
/// these is returned.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CastError {
    /// The rank slot is outside `[0, MAX_RANKS)`.
    InvalidRank { rank: usize },
    /// The option index is outside the poll's option list.
    InvalidOption { index: usize, option_count: usize },
    /// The option already sits in a different rank slot of the same ballot.
    DuplicateOptionVote { index: usize, existing_rank: usize },
}

impl Error for CastError {}

impl Display for CastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CastError::InvalidRank { rank } => {
                write!(f, "rank must be between 0 and {}, got {}", MAX_RANKS, rank)
            }
            CastError::InvalidOption {
                index,
                option_count,
            } => {
                write!(
                    f,
                    "option index {} is not valid for a poll with {} options",
                    index, option_count
                )
            }
            CastError::DuplicateOptionVote {
                index,
                existing_rank,
            } => {
                write!(
                    f,
                    "option {} is already ranked at slot {} of this ballot",
                    index, existing_rank
                )
            }
        }
    }
}

/// Failures of the tabulation itself.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TallyError {
    /// The elimination loop exceeded its round bound. This cannot happen for
    /// a store that upholds its ballot invariants and indicates a logic bug
    /// in the caller or in the tabulator.
    RunawayTabulation { rounds: u32 },
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyError::RunawayTabulation { rounds } => {
                write!(f, "tabulation did not terminate after {} rounds", rounds)
            }
        }
    }
}
