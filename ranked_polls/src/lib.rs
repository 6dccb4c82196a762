mod config;
mod store;

pub mod manual;

use log::{debug, error, info};

pub use crate::config::*;
pub use crate::store::{BallotId, RankedPoll};

/// The floor for the display intensity of an option.
pub const MIN_OPACITY: f64 = 0.2;

// Elimination rounds past this bound abort the tabulation. A correct store
// never comes close: every round removes one option.
const ROUND_LIMIT: u32 = 300;

// **** Private structures ****

// Cross-round tally state for one option.
#[derive(Eq, PartialEq, Debug, Clone)]
struct OptionState {
    peak_votes: u64,
    excluded: bool,
    rank_distribution: [u64; MAX_RANKS],
}

impl OptionState {
    const EMPTY: OptionState = OptionState {
        peak_votes: 0,
        excluded: false,
        rank_distribution: [0; MAX_RANKS],
    };
}

// Working copy of one ballot. The flags record which rank slots have already
// been folded into the rank distributions, so that a (ballot, rank) pair
// counts at most once across all rounds.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotState {
    ranks: [Option<usize>; MAX_RANKS],
    distribution_counted: [bool; MAX_RANKS],
}

// What a single elimination round decided.
#[derive(Eq, PartialEq, Debug, Clone)]
enum RoundOutcome {
    Eliminated(usize),
    // No option could be separated from the leaders: the remaining options
    // form the winner tier, in ascending index order.
    WinnerTier(Vec<usize>),
}

/// Runs the instant-runoff tabulation for the given options and ballots.
///
/// The computation is pure and deterministic: it recomputes every round from
/// scratch and carries no state between invocations. The result is ordered
/// winner first, down to the option eliminated first, and covers every
/// option exactly once. Each record reports the option's peak
/// first-preference count, its rank distribution over the raw ballots and a
/// display opacity.
///
/// Options under the two-thirds rule are only eligible to win a round when
/// they hold at least two thirds of the votes cast in it; short of that they
/// land on the elimination block even with a raw plurality.
pub fn tabulate(
    options: &[PollOption],
    ballots: &[Ballot],
) -> Result<Vec<OptionTally>, TallyError> {
    info!(
        "tabulate: {} ballots over {} options",
        ballots.len(),
        options.len()
    );

    let mut option_states: Vec<OptionState> = options.iter().map(|_| OptionState::EMPTY).collect();

    // Without ballots there is nothing to eliminate: report every option
    // with an empty tally, in option order.
    if ballots.is_empty() {
        return Ok((0..options.len())
            .map(|index| OptionTally {
                index,
                votes: 0,
                rank_distribution: [0; MAX_RANKS],
                opacity: MIN_OPACITY,
            })
            .collect());
    }

    let mut ballot_states: Vec<BallotState> = ballots
        .iter()
        .map(|b| BallotState {
            ranks: b.ranks,
            distribution_counted: [false; MAX_RANKS],
        })
        .collect();

    // Options enter this list in elimination order; the winner tier is
    // appended last.
    let mut elimination_order: Vec<usize> = Vec::with_capacity(options.len());

    let mut round: u32 = 0;
    loop {
        match run_one_round(options, &mut option_states, &mut ballot_states, round) {
            RoundOutcome::Eliminated(index) => {
                debug!("tabulate: round {}: eliminating option {}", round, index);
                elimination_order.push(index);
                option_states[index].excluded = true;
            }
            RoundOutcome::WinnerTier(winners) => {
                debug!("tabulate: round {}: winner tier {:?}", round, winners);
                elimination_order.extend(winners);
                break;
            }
        }
        round += 1;
        if round > ROUND_LIMIT {
            error!(
                "tabulate: no termination after {} elimination rounds, aborting",
                round
            );
            return Err(TallyError::RunawayTabulation { rounds: round });
        }
    }

    let overall_peak = option_states.iter().map(|s| s.peak_votes).max().unwrap_or(0);

    // Winners first, the option eliminated first comes last.
    let result = elimination_order
        .iter()
        .rev()
        .map(|&index| {
            let state = &option_states[index];
            OptionTally {
                index,
                votes: state.peak_votes,
                rank_distribution: state.rank_distribution,
                opacity: opacity(state.peak_votes, overall_peak),
            }
        })
        .collect();
    Ok(result)
}

// One pass of the runoff loop: credit every ballot's first still-active
// preference, fold fresh (ballot, rank) pairs into the rank distributions,
// and pick the weakest option that is not tied with the strongest eligible
// one.
fn run_one_round(
    options: &[PollOption],
    option_states: &mut [OptionState],
    ballot_states: &mut [BallotState],
    round: u32,
) -> RoundOutcome {
    let mut round_votes: Vec<u64> = vec![0; options.len()];
    let mut total_cast: u64 = 0;

    for ballot in ballot_states.iter_mut() {
        let mut credited = false;
        for (rank, slot) in ballot.ranks.iter().enumerate() {
            let index = match slot {
                Some(index) => *index,
                None => continue,
            };
            if !ballot.distribution_counted[rank] {
                option_states[index].rank_distribution[rank] += 1;
                ballot.distribution_counted[rank] = true;
            }
            if option_states[index].excluded || credited {
                continue;
            }
            round_votes[index] += 1;
            total_cast += 1;
            credited = true;
        }
    }

    // A two-thirds option is only eligible when it carries at least 2/3 of
    // the votes cast this round. The comparison stays in integers.
    let mut max_eligible: u64 = 0;
    for (index, state) in option_states.iter().enumerate() {
        if state.excluded {
            continue;
        }
        let count = round_votes[index];
        if !options[index].is_two_thirds || 3 * count >= 2 * total_cast {
            max_eligible = max_eligible.max(count);
        }
    }

    // Everything short of the best eligible count is up for elimination. A
    // two-thirds option below its cutoff lands here even when it holds the
    // raw plurality.
    let mut candidates: Vec<(usize, u64)> = Vec::new();
    for (index, state) in option_states.iter_mut().enumerate() {
        if state.excluded {
            continue;
        }
        let count = round_votes[index];
        state.peak_votes = state.peak_votes.max(count);
        if count != max_eligible {
            candidates.push((index, count));
        }
    }

    debug!(
        "run_one_round: round {}: votes {:?}, total {}, max eligible {}, candidates {:?}",
        round, round_votes, total_cast, max_eligible, candidates
    );

    if candidates.is_empty() {
        let winners: Vec<usize> = option_states
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.excluded)
            .map(|(index, _)| index)
            .collect();
        return RoundOutcome::WinnerTier(winners);
    }

    // Weakest count goes first; the sort is stable, so equal counts fall
    // back to ascending option index.
    candidates.sort_by_key(|&(_, count)| count);
    RoundOutcome::Eliminated(candidates[0].0)
}

fn opacity(peak: u64, overall_peak: u64) -> f64 {
    if overall_peak == 0 {
        return MIN_OPACITY;
    }
    (peak as f64 / overall_peak as f64).max(MIN_OPACITY)
}
