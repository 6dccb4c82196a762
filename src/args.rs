use clap::Parser;

/// This is a tabulation program for ranked polls with optional two-thirds
/// supermajority options.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The poll description in JSON format: title, options and
    /// optionally the ballot events themselves. For more information about
    /// the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path, optional) Ballot events in CSV form
    /// (voter,action,option,rank). They are appended after the events listed
    /// in the configuration file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) A reference file containing the expected summary in JSON
    /// format. If provided, polltab will check that the tabulated output
    /// matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll
    /// will be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, renders the obscured snapshot: the option
    /// list is kept, results and ballots are withheld.
    #[clap(long, takes_value = false)]
    pub obscured: bool,

    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
