use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const CALL_DOTS_CMD: &str = "call-dots";

pub fn create_call_dots_cli() -> Command {
    Command::new(CALL_DOTS_CMD)
        .author("hicdots")
        .about("Call dots (chromatin loops) on a balanced Hi-C contact matrix given its cis expected.")
        .arg(
            Arg::new("bins")
                .long("bins")
                .required(true)
                .help("Bin table (chrom, start, end, weight columns), optionally gzipped"),
        )
        .arg(
            Arg::new("pixels")
                .long("pixels")
                .required(true)
                .help("Upper-triangular pixel table (bin1_id, bin2_id, count), optionally gzipped"),
        )
        .arg(
            Arg::new("expected")
                .long("expected")
                .required(true)
                .help("Cis expected table (chrom or region, diag, value columns)"),
        )
        .arg(arg!(--"expected-name" <NAME> "Column of the expected table holding the expected values"))
        .arg(arg!(--"weight-name" <NAME> "Column of the bin table holding the balancing weights"))
        .arg(
            Arg::new("nproc")
                .long("nproc")
                .short('n')
                .value_parser(value_parser!(usize))
                .help("Number of worker threads"),
        )
        .arg(
            arg!(--"max-loci-separation" <BP> "Only score pixels closer to the diagonal than this")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(--"max-nans-tolerated" <N> "Pixels with at least this many masked neighbours in a kernel footprint are dropped")
                .value_parser(value_parser!(u32)),
        )
        .arg(arg!(--"tile-size" <BP> "Edge length of the square tiles").value_parser(value_parser!(u64)))
        .arg(arg!(--fdr <FDR> "False discovery rate for every kernel").value_parser(value_parser!(f64)))
        .arg(
            arg!(--"dots-clustering-radius" <BP> "Pixels closer than this are merged into one cluster")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("chromosomes")
                .long("chromosomes")
                .num_args(1..)
                .value_delimiter(',')
                .help("Restrict the analysis to these chromosomes"),
        )
        .arg(
            arg!(--"qvalue-method" <METHOD> "How q-values are computed")
                .value_parser(["genome-wide", "lambda-chunked"]),
        )
        .arg(arg!(-c --config <TOML> "TOML file with run parameters; flags override it"))
        .arg(
            Arg::new("output-scores")
                .long("output-scores")
                .short('s')
                .help("Write every scored pixel to this file (gzipped when it ends in .gz)"),
        )
        .arg(
            Arg::new("output-hists")
                .long("output-hists")
                .help("Write per-kernel lambda-chunk histograms as <PREFIX>.<kernel>.hist.txt"),
        )
        .arg(
            Arg::new("output-calls")
                .long("output-calls")
                .short('o')
                .required(true)
                .help("Output file for the final dot calls"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Show a progress bar while scoring tiles"),
        )
}
