use log::{debug, info, warn};

use ranked_polls::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::poll::config_reader::*;
use crate::poll::csv_reader::*;

#[derive(Debug, Snafu)]
pub enum PollRunError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error rendering the summary"))]
    RenderingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno}: field {field} is missing or invalid"))]
    BadEventField { lineno: usize, field: String },
    #[snafu(display("Event for voter {voter}: missing field {field}"))]
    MissingEventField { voter: String, field: String },
    #[snafu(display("Event for voter {voter} was rejected"))]
    RejectedEvent { source: CastError, voter: String },
    #[snafu(display("The tabulation failed"))]
    Tabulation { source: TallyError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollRunResult<T> = Result<T, PollRunError>;

pub mod config_reader {
    use crate::poll::*;

    /// Poll options come either as a bare label or as a full record, the
    /// same two notations the poll creation payload accepts.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum OptionSpec {
        Label(String),
        Record {
            text: String,
            #[serde(rename = "isTwoThirds", default)]
            is_two_thirds: bool,
        },
    }

    impl OptionSpec {
        pub fn to_poll_option(&self) -> PollOption {
            match self {
                OptionSpec::Label(text) => PollOption::new(text),
                OptionSpec::Record {
                    text,
                    is_two_thirds,
                } => PollOption {
                    text: text.clone(),
                    is_two_thirds: *is_two_thirds,
                },
            }
        }
    }

    /// One entry of the ballot event log. `action` defaults to `cast`.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct BallotEvent {
        pub voter: String,
        pub action: Option<String>,
        #[serde(rename = "optionIndex")]
        pub option_index: Option<usize>,
        pub rank: Option<usize>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PollConfig {
        pub title: String,
        pub obscure: Option<bool>,
        pub options: Vec<OptionSpec>,
        #[serde(default)]
        pub events: Vec<BallotEvent>,
    }

    pub fn read_poll_config(path: &str) -> PollRunResult<PollConfig> {
        let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
        let config: PollConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
        debug!("read_poll_config: {:?}", config);
        Ok(config)
    }

    pub fn read_summary(path: &str) -> PollRunResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
        let js: JSValue =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
        Ok(js)
    }
}

pub mod csv_reader {
    use crate::poll::*;

    /// Reads ballot events in tabular form. Expected columns, with a header
    /// row: `voter,action,option,rank`. `option` and `rank` stay empty for
    /// `clear` events.
    pub fn read_csv_events(path: &str) -> PollRunResult<Vec<BallotEvent>> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .context(CsvOpenSnafu { path })?;
        events_from_reader(rdr)
    }

    pub fn events_from_reader<R: std::io::Read>(
        mut rdr: csv::Reader<R>,
    ) -> PollRunResult<Vec<BallotEvent>> {
        let mut res: Vec<BallotEvent> = Vec::new();
        for (idx, record_r) in rdr.records().enumerate() {
            // The header occupies the first line.
            let lineno = idx + 2;
            let record = record_r.context(CsvLineParseSnafu {})?;
            debug!("events_from_reader: line {}: {:?}", lineno, record);
            res.push(parse_event_record(&record, lineno)?);
        }
        Ok(res)
    }

    fn parse_event_record(
        record: &csv::StringRecord,
        lineno: usize,
    ) -> PollRunResult<BallotEvent> {
        let voter = record
            .get(0)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .context(BadEventFieldSnafu {
                lineno,
                field: "voter",
            })?;
        let action = record
            .get(1)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let option_index = parse_index_field(record.get(2), lineno, "option")?;
        let rank = parse_index_field(record.get(3), lineno, "rank")?;
        Ok(BallotEvent {
            voter: voter.to_string(),
            action,
            option_index,
            rank,
        })
    }

    fn parse_index_field(
        field: Option<&str>,
        lineno: usize,
        name: &str,
    ) -> PollRunResult<Option<usize>> {
        match field.map(|s| s.trim()) {
            None => Ok(None),
            Some("") => Ok(None),
            Some(s) => s
                .parse::<usize>()
                .ok()
                .map(Some)
                .context(BadEventFieldSnafu {
                    lineno,
                    field: name,
                }),
        }
    }
}

/// Applies a ballot event log to a poll, keeping one ballot handle per
/// voter identity the way the session layer would.
pub fn replay_events(poll: &mut RankedPoll, events: &[BallotEvent]) -> PollRunResult<()> {
    let mut handles: HashMap<String, BallotId> = HashMap::new();
    for event in events.iter() {
        let action = event.action.as_deref().unwrap_or("cast");
        match action {
            "cast" => {
                let option_index = event.option_index.context(MissingEventFieldSnafu {
                    voter: event.voter.as_str(),
                    field: "optionIndex",
                })?;
                let rank = event.rank.context(MissingEventFieldSnafu {
                    voter: event.voter.as_str(),
                    field: "rank",
                })?;
                let handle = handles.get(&event.voter).copied();
                let id = poll
                    .cast(handle, option_index, rank)
                    .context(RejectedEventSnafu {
                        voter: event.voter.as_str(),
                    })?;
                handles.insert(event.voter.clone(), id);
            }
            "clear" => {
                if let Some(id) = handles.remove(&event.voter) {
                    poll.withdraw(id);
                }
            }
            x => {
                whatever!("Unknown ballot event action {:?}", x)
            }
        }
    }
    Ok(())
}

fn option_tally_to_json(tally: &OptionTally) -> JSValue {
    json!({
        "index": tally.index,
        "votes": tally.votes,
        "rankDistribution": tally.rank_distribution.to_vec(),
        "opacity": format!("{:.3}", tally.opacity),
    })
}

pub fn build_summary_js(title: &str, snapshot: &PollSnapshot) -> JSValue {
    let mut summary: JSMap<String, JSValue> = JSMap::new();
    summary.insert("title".to_string(), json!(title));
    summary.insert("options".to_string(), json!(snapshot.labels));
    summary.insert(
        "obscure".to_string(),
        json!(snapshot.results.is_none()),
    );
    if let Some(results) = &snapshot.results {
        let l: Vec<JSValue> = results.iter().map(option_tally_to_json).collect();
        summary.insert("results".to_string(), JSValue::Array(l));
    }
    if let Some(ballots) = &snapshot.ballots {
        let l: Vec<JSValue> = ballots
            .iter()
            .map(|b| json!([b.rank(0), b.rank(1), b.rank(2)]))
            .collect();
        summary.insert("ballots".to_string(), JSValue::Array(l));
    }
    JSValue::Object(summary)
}

pub fn run_poll(args: &Args) -> PollRunResult<()> {
    let config = read_poll_config(&args.config)?;

    let mut events = config.events.clone();
    if let Some(input) = &args.input {
        let mut csv_events = read_csv_events(input)?;
        events.append(&mut csv_events);
    }
    info!(
        "run_poll: poll {:?}: {} options, {} events",
        config.title,
        config.options.len(),
        events.len()
    );

    let options: Vec<PollOption> = config.options.iter().map(|o| o.to_poll_option()).collect();
    let mut poll = RankedPoll::new(options);
    replay_events(&mut poll, &events)?;

    let obscured = args.obscured || config.obscure.unwrap_or(false);
    let snapshot = if obscured {
        poll.obscured_snapshot()
    } else {
        poll.snapshot().context(TabulationSnafu {})?
    };

    let summary_js = build_summary_js(&config.title, &snapshot);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(RenderingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(out) => fs::write(out, &pretty_js_stats).context(OpeningFileSnafu { path: out })?,
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(RenderingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary");
        }
    }

    Ok(())
}
