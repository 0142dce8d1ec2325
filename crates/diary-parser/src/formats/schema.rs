pub const LEGACY_V11_COLUMNS: [&str; 11] = [
    "disposal_diary_id",
    "gdp_tnt",
    "rec_typ_id",
    "platfrm",
    "disposal_ind",
    "disposal_run_dt",
    "tbl_name",
    "idr_typ",
    "idr_col_name",
    "idr_value",
    "juris",
];

pub const CURRENT_V13_COLUMNS: [&str; 13] = [
    "disposal_diary_id",
    "gdp_tnt",
    "rec_typ_id",
    "platfrm",
    "disposal_ind",
    "disposal_run_dt",
    "tbl_name",
    "idr_typ",
    "idr_col_name",
    "idr_value",
    "idr_start_dt",
    "idr_end_dt",
    "juris",
];
