// expected table
pub const EXPECTED_CHROM_COL: &str = "chrom";
pub const EXPECTED_REGION_COL: &str = "region";
pub const EXPECTED_DIAG_COL: &str = "diag";
pub const EXPECTED_NVALID_COL: &str = "n_valid";

// bins and pixels tables
pub const BINS_CHROM_COL: &str = "chrom";
pub const BINS_START_COL: &str = "start";
pub const BINS_END_COL: &str = "end";
pub const PIXELS_BIN1_COL: &str = "bin1_id";
pub const PIXELS_BIN2_COL: &str = "bin2_id";
pub const PIXELS_COUNT_COL: &str = "count";

pub const HISTOGRAM_SUFFIX: &str = "hist.txt";
pub const HISTOGRAM_INDEX_COL: &str = "observed";

pub const DOT_CALL_COLUMNS: [&str; 20] = [
    "chrom1",
    "start1",
    "end1",
    "chrom2",
    "start2",
    "end2",
    "cstart1",
    "cstart2",
    "c_label",
    "c_size",
    "obs.raw",
    "exp.raw",
    "la_exp.donut.value",
    "la_exp.vertical.value",
    "la_exp.horizontal.value",
    "la_exp.lowleft.value",
    "la_exp.donut.qval",
    "la_exp.vertical.qval",
    "la_exp.horizontal.qval",
    "la_exp.lowleft.qval",
];
