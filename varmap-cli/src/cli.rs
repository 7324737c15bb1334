use clap::{Arg, ArgAction, Command, arg};

pub const SEARCH_CMD: &str = "search";
pub const EXPORT_CMD: &str = "export";

fn repeatable(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::Append)
        .help(help)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn shared_args(command: Command) -> Command {
    command
        .arg(arg!(-d --data <dir> "Directory of TSV relation files").required(true))
        // identifiers
        .arg(repeatable("uniprot", "UniProt accession (repeatable)"))
        .arg(repeatable("gene", "Gene symbol (repeatable)"))
        .arg(repeatable("ensembl", "Ensembl gene/transcript/protein id (repeatable)"))
        .arg(repeatable("pdb", "PDB structure id (repeatable)"))
        .arg(repeatable("refseq", "RefSeq id, optionally versioned (repeatable)"))
        // annotation filters
        .arg(repeatable("cadd", "CADD band as min:max, or a named category"))
        .arg(repeatable(
            "allele-freq",
            "Allele frequency band as min:max, or a named category",
        ))
        .arg(repeatable("popeve", "PopEVE band as min:max, or a named class"))
        .arg(repeatable(
            "am",
            "AlphaMissense class: likely_benign, ambiguous or likely_pathogenic",
        ))
        .arg(repeatable(
            "stability",
            "Stability class: likely_destabilising or unlikely_destabilising",
        ))
        .arg(flag("known", "Keep only catalogued variants"))
        .arg(flag("pocket", "Keep only residues in a predicted pocket"))
        .arg(flag("interact", "Keep only residues at a predicted interface"))
        .arg(flag(
            "experimental",
            "Keep only residues covered by an experimental structure",
        ))
        .arg(arg!(--"conservation-min" <score> "Minimum conservation score"))
        .arg(arg!(--"conservation-max" <score> "Maximum conservation score"))
        .arg(arg!(--"esm1b-min" <score> "Minimum ESM1b score"))
        .arg(arg!(--"esm1b-max" <score> "Maximum ESM1b score"))
        // ordering
        .arg(arg!(-s --sort <key> "Sort key: cadd, am, popeve or esm1b"))
        .arg(flag("desc", "Sort descending"))
}

pub fn create_search_cli() -> Command {
    shared_args(
        Command::new(SEARCH_CMD)
            .about("Retrieve one page of matching variants, with the total count"),
    )
    .arg(arg!(-p --page <n> "1-based page number"))
    .arg(arg!(--"page-size" <n> "Rows per page"))
}

pub fn create_export_cli() -> Command {
    shared_args(
        Command::new(EXPORT_CMD)
            .about("Retrieve every matching variant, paging mechanically with no count"),
    )
}
