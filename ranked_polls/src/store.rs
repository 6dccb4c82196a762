use log::debug;

use crate::config::*;
use crate::tabulate;

/// Opaque handle to a ballot held by a [`RankedPoll`].
///
/// Voters keep the handle returned by [`RankedPoll::cast`] to update or
/// withdraw their ballot later; the store itself does not know voter
/// identities.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct BallotId(u64);

#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotEntry {
    id: BallotId,
    ballot: Ballot,
}

/// A single ranked poll: the option list, the ballot store and the memoized
/// result.
///
/// All mutations go through `&mut self`, so access to one poll is serialized
/// by construction; separate polls share nothing and may live on different
/// threads.
#[derive(Debug, Clone)]
pub struct RankedPoll {
    options: Vec<PollOption>,
    ballots: Vec<BallotEntry>,
    next_id: u64,
    // Cleared by every mutation, filled again by the next result read.
    cached_results: Option<Vec<OptionTally>>,
}

impl RankedPoll {
    /// Opens a poll over a fixed option list. The list cannot change
    /// afterwards; options are addressed by their position in it.
    pub fn new(options: Vec<PollOption>) -> RankedPoll {
        RankedPoll {
            options,
            ballots: Vec::new(),
            next_id: 0,
            cached_results: None,
        }
    }

    pub fn options(&self) -> &[PollOption] {
        &self.options
    }

    pub fn ballot_count(&self) -> usize {
        self.ballots.len()
    }

    /// The ballot behind a handle, if it is still stored.
    pub fn ballot(&self, id: BallotId) -> Option<&Ballot> {
        self.ballots.iter().find(|e| e.id == id).map(|e| &e.ballot)
    }

    /// Records one ranked choice.
    ///
    /// With a known `handle` the voter's existing ballot is updated in place
    /// and keeps its identity; the slot at `rank` is replaced with
    /// `option_index`. Without one (or with a handle that has been
    /// withdrawn) a new ballot is stored. The returned handle addresses the
    /// ballot for future updates and withdrawal.
    ///
    /// Ranking an option the ballot already carries in a different slot is
    /// rejected with [`CastError::DuplicateOptionVote`]; re-submitting the
    /// exact same slot is allowed and changes nothing. Nothing is mutated
    /// when an error is returned.
    pub fn cast(
        &mut self,
        handle: Option<BallotId>,
        option_index: usize,
        rank: usize,
    ) -> Result<BallotId, CastError> {
        if rank >= MAX_RANKS {
            return Err(CastError::InvalidRank { rank });
        }
        if option_index >= self.options.len() {
            return Err(CastError::InvalidOption {
                index: option_index,
                option_count: self.options.len(),
            });
        }

        let existing = handle.and_then(|id| self.ballots.iter().position(|e| e.id == id));

        if let Some(pos) = existing {
            let ranks = &self.ballots[pos].ballot.ranks;
            if let Some(existing_rank) = ranks.iter().position(|slot| *slot == Some(option_index)) {
                if existing_rank != rank {
                    return Err(CastError::DuplicateOptionVote {
                        index: option_index,
                        existing_rank,
                    });
                }
            }
        }

        let id = match existing {
            Some(pos) => {
                self.ballots[pos].ballot.ranks[rank] = Some(option_index);
                self.ballots[pos].id
            }
            None => {
                let id = BallotId(self.next_id);
                self.next_id += 1;
                let mut ballot = Ballot::default();
                ballot.ranks[rank] = Some(option_index);
                self.ballots.push(BallotEntry { id, ballot });
                id
            }
        };
        debug!("cast: ballot {:?}: rank {} -> option {}", id, rank, option_index);
        self.cached_results = None;
        Ok(id)
    }

    /// Removes a ballot. Unknown or already-withdrawn handles are ignored.
    pub fn withdraw(&mut self, handle: BallotId) {
        let before = self.ballots.len();
        self.ballots.retain(|e| e.id != handle);
        if self.ballots.len() != before {
            debug!("withdraw: removed ballot {:?}", handle);
            self.cached_results = None;
        }
    }

    /// The winner-first tabulation of the current ballots.
    ///
    /// The result is memoized until the next mutation; recomputing
    /// unconditionally would be observably equivalent. A tabulation error
    /// propagates to the caller and leaves nothing cached.
    pub fn results(&mut self) -> Result<&[OptionTally], TallyError> {
        let results = match self.cached_results.take() {
            Some(results) => results,
            None => {
                let ballots: Vec<Ballot> = self.ballots.iter().map(|e| e.ballot).collect();
                tabulate(&self.options, &ballots)?
            }
        };
        Ok(self.cached_results.insert(results))
    }

    /// The full display snapshot: labels, raw options, results and ballots.
    pub fn snapshot(&mut self) -> Result<PollSnapshot, TallyError> {
        let results = self.results()?.to_vec();
        Ok(PollSnapshot {
            labels: self.labels(),
            options: self.options.clone(),
            results: Some(results),
            ballots: Some(self.ballots.iter().map(|e| e.ballot).collect()),
        })
    }

    /// The snapshot for polls whose outcome must stay hidden until they
    /// close: the option list survives, results and ballots are stripped.
    pub fn obscured_snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            labels: self.labels(),
            options: self.options.clone(),
            results: None,
            ballots: None,
        }
    }

    fn labels(&self) -> Vec<String> {
        self.options.iter().map(|o| o.display_label()).collect()
    }
}
