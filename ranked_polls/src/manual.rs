/*!

This is the long-form manual for `ranked_polls` and `polltab`.

## The poll model

A poll is opened over a fixed list of options. Every option is addressed by
its position in that list, and positions never change for the lifetime of
the poll. An option can be flagged as a *two-thirds* option: it then needs
at least two thirds of the votes cast in a round to stay in contention, and
its display label carries a `(2/3ds)` annotation.

Voters rank up to 3 options. A ballot is a sparse mapping from rank slot
(0, 1, 2) to option index. Casting without a handle stores a fresh ballot
and returns a handle; casting again with that handle updates the same
ballot in place, replacing whatever sat at the given rank. Two rules are
enforced at cast time:

* the rank must be one of the 3 slots and the option index must exist;
* the same option may not occupy two different slots of one ballot.
  Re-submitting the slot it already occupies is accepted and is a no-op.

Withdrawing a ballot removes it entirely; withdrawing twice is harmless.

## Tabulation

Results are computed with an instant-runoff scheme. Each round credits
every ballot's first still-active preference, then eliminates the weakest
option that is not tied with the strongest *eligible* option. A two-thirds
option short of its cutoff is never eligible, so it can land on the
elimination block while holding the raw plurality. Ties for elimination are
broken towards the lowest option index. When no option can be separated
from the leaders, the remaining options form the winner tier and the
tabulation ends.

The reported standing of an option is the highest vote count it reached in
any round, together with a per-rank distribution of the raw ballots (each
ballot slot counts exactly once, no matter how many rounds run) and a
display opacity in `[0.2, 1.0]` derived from its peak count relative to the
best peak count of the poll.

Results are memoized on the poll and recomputed from scratch after any
mutation. The recomputation is intentionally not incremental: it keeps the
outcome a pure function of the current options and ballots.

## Snapshots

[`RankedPoll::snapshot`](crate::RankedPoll::snapshot) returns the
display-ready view: labels, raw option records, winner-first results and
the stored ballots. For polls whose outcome must stay hidden until they
close, [`RankedPoll::obscured_snapshot`](crate::RankedPoll::obscured_snapshot)
keeps the option list and withholds everything else.

## The `polltab` input format

`polltab` replays a ballot event log against a poll description in JSON:

```json
{
    "title": "What do we watch",
    "obscure": false,
    "options": [
        { "text": "the long movie", "isTwoThirds": true },
        "the short movie"
    ],
    "events": [
        { "voter": "ada", "optionIndex": 0, "rank": 0 },
        { "voter": "ben", "optionIndex": 1, "rank": 0 },
        { "voter": "ben", "action": "clear" }
    ]
}
```

Options come either as a bare label or as a full record. Events are applied
in order; `cast` (the default action) records or updates the voter's
ballot, `clear` withdraws it. Events may also be supplied as a CSV file
with a `voter,action,option,rank` header via `--input`, appended after the
events of the configuration file.

The tabulated summary is written as JSON to stdout or `--out`. With
`--reference`, the summary is compared against a reference file and any
difference is reported and fails the run.

*/
