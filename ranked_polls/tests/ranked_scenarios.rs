// End-to-end scenarios driven through the public poll API, one voter per
// named handle, the way a poll service would drive it.

use std::collections::HashMap;

use ranked_polls::*;

struct Voters {
    handles: HashMap<&'static str, BallotId>,
}

impl Voters {
    fn new() -> Voters {
        Voters {
            handles: HashMap::new(),
        }
    }

    fn cast(&mut self, poll: &mut RankedPoll, voter: &'static str, option: usize, rank: usize) {
        let handle = self.handles.get(voter).copied();
        let id = poll.cast(handle, option, rank).unwrap();
        self.handles.insert(voter, id);
    }

    fn clear(&mut self, poll: &mut RankedPoll, voter: &'static str) {
        if let Some(id) = self.handles.remove(voter) {
            poll.withdraw(id);
        }
    }
}

fn standings(poll: &mut RankedPoll) -> Vec<(usize, u64)> {
    poll.results()
        .unwrap()
        .iter()
        .map(|t| (t.index, t.votes))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {} to be {}",
        actual,
        expected
    );
}

#[test]
fn supermajority_option_loses_a_plurality_first_round() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("op1"),
        PollOption::new("op2"),
        PollOption::new("op3"),
        PollOption::new("op4"),
    ]);
    let mut voters = Voters::new();
    voters.cast(&mut poll, "user1", 0, 0);
    voters.cast(&mut poll, "user2", 0, 0);
    voters.cast(&mut poll, "user3", 1, 0);
    voters.cast(&mut poll, "user4", 2, 0);

    // op1 holds the plurality but misses its two-thirds cutoff; op2 and op3
    // share the winner tier and op3 tops the list after reversal.
    assert_eq!(standings(&mut poll), vec![(2, 1), (1, 1), (0, 2), (3, 0)]);

    let results = poll.results().unwrap();
    assert_eq!(results[0].rank_distribution, [1, 0, 0]);
    assert_close(results[0].opacity, 0.5);
    let op1 = results.iter().find(|t| t.index == 0).unwrap();
    assert_close(op1.opacity, 1.0);
    let op4 = results.iter().find(|t| t.index == 3).unwrap();
    assert_close(op4.opacity, 0.2);
}

#[test]
fn second_rank_preferences_flip_the_leader() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new("op1"),
        PollOption::new("op2"),
        PollOption::new("op3"),
        PollOption::new("op4"),
    ]);
    let mut voters = Voters::new();
    voters.cast(&mut poll, "user1", 0, 0);
    voters.cast(&mut poll, "user1", 2, 1);
    voters.cast(&mut poll, "user2", 1, 0);
    voters.cast(&mut poll, "user2", 2, 1);
    voters.cast(&mut poll, "user3", 2, 0);
    voters.cast(&mut poll, "user4", 2, 0);
    voters.cast(&mut poll, "user5", 3, 0);
    voters.cast(&mut poll, "user6", 3, 0);
    voters.cast(&mut poll, "user7", 3, 0);

    // op4 leads round 0 with 3 votes, but the transfers from op1 and op2
    // lift op3 to 4.
    assert_eq!(
        standings(&mut poll),
        vec![(2, 4), (3, 3), (1, 1), (0, 1)]
    );

    let results = poll.results().unwrap();
    let op3 = results.iter().find(|t| t.index == 2).unwrap();
    assert_eq!(op3.rank_distribution, [2, 2, 0]);
}

#[test]
fn two_thirds_option_fails_its_cutoff() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("Two Thirds Loser"),
        PollOption::new("Normal Winner"),
    ]);
    let mut voters = Voters::new();
    for voter in ["user1", "user2", "user3", "user4", "user5"] {
        voters.cast(&mut poll, voter, 0, 0);
    }
    for voter in ["user6", "user7", "user8", "user9"] {
        voters.cast(&mut poll, voter, 1, 0);
    }

    // 5 of 9 votes is short of the cutoff of 6.
    assert_eq!(standings(&mut poll), vec![(1, 4), (0, 5)]);
}

#[test]
fn two_thirds_option_meets_its_cutoff() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("Two Thirds Winner"),
        PollOption::new("Normal Winner"),
    ]);
    let mut voters = Voters::new();
    for voter in ["user1", "user2", "user3", "user4", "user5", "user6"] {
        voters.cast(&mut poll, voter, 0, 0);
    }
    for voter in ["user7", "user8", "user9"] {
        voters.cast(&mut poll, voter, 1, 0);
    }

    assert_eq!(standings(&mut poll), vec![(0, 6), (1, 3)]);
}

#[test]
fn a_changed_vote_pushes_a_two_thirds_option_over_its_cutoff() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("Two Thirds Winner"),
        PollOption::new("Normal Winner"),
    ]);
    let mut voters = Voters::new();
    for voter in ["user1", "user2", "user3", "user4", "user5"] {
        voters.cast(&mut poll, voter, 0, 0);
    }
    for voter in ["user6", "user7", "user8", "user9"] {
        voters.cast(&mut poll, voter, 1, 0);
    }
    assert_eq!(standings(&mut poll), vec![(1, 4), (0, 5)]);

    // user6 swings from op2 to op1: same ballot, same rank, new option.
    voters.cast(&mut poll, "user6", 0, 0);
    assert_eq!(poll.ballot_count(), 9);
    assert_eq!(standings(&mut poll), vec![(0, 6), (1, 3)]);
}

#[test]
fn two_thirds_option_wins_after_a_runoff() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("Two Thirds Winner"),
        PollOption::new("Normal Winner"),
        PollOption::new("Last Place"),
    ]);
    let mut voters = Voters::new();
    for voter in ["user1", "user2", "user3", "user4", "user5"] {
        voters.cast(&mut poll, voter, 0, 0);
    }
    for voter in ["user6", "user7", "user8"] {
        voters.cast(&mut poll, voter, 1, 0);
    }
    voters.cast(&mut poll, "user9", 2, 0);
    voters.cast(&mut poll, "user9", 0, 1);

    // Eliminating the last-place option transfers user9's ballot and lifts
    // the flagged option to exactly 6 of 9.
    assert_eq!(standings(&mut poll), vec![(0, 6), (1, 3), (2, 1)]);
}

#[test]
fn two_thirds_option_loses_even_after_a_runoff() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new_two_thirds("Two Thirds Winner"),
        PollOption::new("Normal Winner"),
        PollOption::new("Last Place"),
    ]);
    let mut voters = Voters::new();
    for voter in ["user1", "user2", "user3", "user4", "user5"] {
        voters.cast(&mut poll, voter, 0, 0);
    }
    for voter in ["user6", "user7", "user8", "userA"] {
        voters.cast(&mut poll, voter, 1, 0);
    }
    voters.cast(&mut poll, "user9", 2, 0);
    voters.cast(&mut poll, "user9", 0, 1);

    // Even with the transfer the flagged option reaches only 6 of 10.
    assert_eq!(standings(&mut poll), vec![(1, 4), (0, 6), (2, 1)]);
}

#[test]
fn results_cover_every_option_exactly_once() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new("a"),
        PollOption::new_two_thirds("b"),
        PollOption::new("c"),
        PollOption::new("d"),
        PollOption::new("e"),
    ]);
    let mut voters = Voters::new();
    voters.cast(&mut poll, "u1", 1, 0);
    voters.cast(&mut poll, "u1", 3, 1);
    voters.cast(&mut poll, "u2", 3, 0);
    voters.cast(&mut poll, "u3", 4, 0);
    voters.cast(&mut poll, "u3", 0, 1);
    voters.cast(&mut poll, "u3", 1, 2);

    let mut indices: Vec<usize> = poll.results().unwrap().iter().map(|t| t.index).collect();
    assert_eq!(indices.len(), 5);
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn withdrawing_every_ballot_restores_the_empty_standing() {
    let mut poll = RankedPoll::new(vec![PollOption::new("a"), PollOption::new("b")]);
    let mut voters = Voters::new();
    voters.cast(&mut poll, "u1", 0, 0);
    voters.cast(&mut poll, "u2", 1, 0);
    voters.cast(&mut poll, "u2", 0, 1);
    assert!(poll.results().unwrap().iter().any(|t| t.votes > 0));

    voters.clear(&mut poll, "u1");
    voters.clear(&mut poll, "u2");
    // Clearing an unknown voter is a no-op.
    voters.clear(&mut poll, "u3");

    let results = poll.results().unwrap().to_vec();
    assert_eq!(poll.ballot_count(), 0);
    let order: Vec<usize> = results.iter().map(|t| t.index).collect();
    assert_eq!(order, vec![0, 1]);
    for tally in results {
        assert_eq!(tally.votes, 0);
        assert_eq!(tally.rank_distribution, [0, 0, 0]);
        assert_close(tally.opacity, 0.2);
    }
}

#[test]
fn rank_distribution_grows_monotonically_as_ballots_arrive() {
    let mut poll = RankedPoll::new(vec![
        PollOption::new("a"),
        PollOption::new("b"),
        PollOption::new("c"),
    ]);
    let mut voters = Voters::new();

    let mut previous = vec![[0u64; MAX_RANKS]; 3];
    let casts: [(&'static str, usize, usize); 6] = [
        ("u1", 0, 0),
        ("u1", 1, 1),
        ("u2", 1, 0),
        ("u3", 2, 0),
        ("u3", 0, 1),
        ("u4", 1, 0),
    ];
    for (voter, option, rank) in casts {
        voters.cast(&mut poll, voter, option, rank);
        let results = poll.results().unwrap();
        for tally in results {
            let old = previous[tally.index];
            for r in 0..MAX_RANKS {
                assert!(tally.rank_distribution[r] >= old[r]);
            }
            previous[tally.index] = tally.rank_distribution;
        }
    }
    assert_eq!(previous[1], [2, 1, 0]);
}
