use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use serde_json::json;

use varmap_core::models::request::{
    AlleleFreqCategory, AmClass, CaddCategory, FilterSpec, PopEveClass, ScoreBand, SearchRequest,
    SearchTerm, SortKey, SortOrder, SortSpec, StabilityClass,
};
use varmap_query::{InMemoryStore, SearchEngine};

pub fn run_search(matches: &ArgMatches) -> Result<()> {
    let request = build_request(matches, true)?;
    let store = load_store(matches)?;
    let engine = SearchEngine::new(&store);

    let page = engine.search(&request)?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

pub fn run_export(matches: &ArgMatches) -> Result<()> {
    let request = build_request(matches, false)?;
    let store = load_store(matches)?;
    let engine = SearchEngine::new(&store);

    let rows = engine.export(&request)?;
    println!("{}", serde_json::to_string_pretty(&json!({ "content": rows }))?);
    Ok(())
}

fn load_store(matches: &ArgMatches) -> Result<InMemoryStore> {
    let data_dir = matches
        .get_one::<String>("data")
        .expect("A path to a data directory is required.");
    InMemoryStore::from_data_dir(data_dir)
        .with_context(|| format!("loading relations from {}", data_dir))
}

fn build_request(matches: &ArgMatches, paged: bool) -> Result<SearchRequest> {
    let mut request = SearchRequest {
        search_terms: collect_terms(matches),
        filters: collect_filters(matches)?,
        sort: collect_sort(matches)?,
        ..Default::default()
    };

    if paged {
        if let Some(page) = matches.get_one::<String>("page") {
            request.page = page.parse().context("--page must be a positive integer")?;
        }
        if let Some(size) = matches.get_one::<String>("page-size") {
            request.page_size = size
                .parse()
                .context("--page-size must be a positive integer")?;
        }
    }

    Ok(request)
}

fn values_of(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn collect_terms(matches: &ArgMatches) -> Vec<SearchTerm> {
    let mut terms = Vec::new();
    for value in values_of(matches, "uniprot") {
        terms.push(SearchTerm::uniprot(value));
    }
    for value in values_of(matches, "gene") {
        terms.push(SearchTerm::gene(value));
    }
    for value in values_of(matches, "ensembl") {
        terms.push(SearchTerm::ensembl(value));
    }
    for value in values_of(matches, "pdb") {
        terms.push(SearchTerm::pdb(value));
    }
    for value in values_of(matches, "refseq") {
        terms.push(SearchTerm::refseq(value));
    }
    terms
}

fn collect_filters(matches: &ArgMatches) -> Result<FilterSpec> {
    let mut filters = FilterSpec {
        known: matches.get_flag("known"),
        pocket: matches.get_flag("pocket"),
        interact: matches.get_flag("interact"),
        experimental_model: matches.get_flag("experimental"),
        ..Default::default()
    };

    for value in values_of(matches, "cadd") {
        filters.cadd.push(parse_cadd_band(&value)?);
    }
    for value in values_of(matches, "allele-freq") {
        filters.allele_freq.push(parse_allele_freq_band(&value)?);
    }
    for value in values_of(matches, "popeve") {
        filters.popeve.push(parse_popeve_band(&value)?);
    }
    for value in values_of(matches, "am") {
        filters.am.push(parse_am_class(&value)?);
    }
    for value in values_of(matches, "stability") {
        filters.stability.push(parse_stability_class(&value)?);
    }

    filters.conservation_min = parse_bound(matches, "conservation-min")?;
    filters.conservation_max = parse_bound(matches, "conservation-max")?;
    filters.esm1b_min = parse_bound(matches, "esm1b-min")?;
    filters.esm1b_max = parse_bound(matches, "esm1b-max")?;

    Ok(filters)
}

fn collect_sort(matches: &ArgMatches) -> Result<SortSpec> {
    let key = match matches.get_one::<String>("sort") {
        Some(value) => value
            .parse::<SortKey>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => SortKey::None,
    };
    let order = if matches.get_flag("desc") {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    };
    Ok(SortSpec { key, order })
}

fn parse_bound(matches: &ArgMatches, name: &str) -> Result<Option<f64>> {
    match matches.get_one::<String>(name) {
        Some(value) => Ok(Some(
            value
                .parse()
                .with_context(|| format!("--{} must be a number", name))?,
        )),
        None => Ok(None),
    }
}

/// Parse "min:max" with either side optionally empty for an open end.
fn parse_band(value: &str) -> Result<ScoreBand> {
    let Some((low, high)) = value.split_once(':') else {
        bail!("band {:?} is not of the form min:max", value);
    };
    let parse_end = |raw: &str| -> Result<Option<f64>> {
        if raw.is_empty() {
            Ok(None)
        } else {
            Ok(Some(raw.parse().with_context(|| {
                format!("bad band bound {:?} in {:?}", raw, value)
            })?))
        }
    };
    Ok(ScoreBand::new(parse_end(low)?, parse_end(high)?))
}

fn parse_cadd_band(value: &str) -> Result<ScoreBand> {
    match value.parse::<CaddCategory>() {
        Ok(category) => Ok(category.band()),
        Err(_) => parse_band(value),
    }
}

fn parse_allele_freq_band(value: &str) -> Result<ScoreBand> {
    match value.parse::<AlleleFreqCategory>() {
        Ok(category) => Ok(category.band()),
        Err(_) => parse_band(value),
    }
}

fn parse_popeve_band(value: &str) -> Result<ScoreBand> {
    match value.parse::<PopEveClass>() {
        Ok(class) => Ok(class.band()),
        Err(_) => parse_band(value),
    }
}

fn parse_am_class(value: &str) -> Result<AmClass> {
    if let Ok(code) = value.parse::<i8>() {
        return AmClass::from_code(code)
            .ok_or_else(|| anyhow::anyhow!("AM class code must be -1, 0 or 1, got {}", code));
    }
    match value.to_lowercase().as_str() {
        "likely_benign" | "benign" => Ok(AmClass::LikelyBenign),
        "ambiguous" => Ok(AmClass::Ambiguous),
        "likely_pathogenic" | "pathogenic" => Ok(AmClass::LikelyPathogenic),
        other => bail!("unknown AM class: {}", other),
    }
}

fn parse_stability_class(value: &str) -> Result<StabilityClass> {
    match value.to_lowercase().as_str() {
        "likely_destabilising" => Ok(StabilityClass::LikelyDestabilising),
        "unlikely_destabilising" => Ok(StabilityClass::UnlikelyDestabilising),
        other => bail!("unknown stability class: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_band_forms() {
        assert_eq!(parse_band("25:30").unwrap(), ScoreBand::between(25.0, 30.0));
        assert_eq!(parse_band(":0.01").unwrap(), ScoreBand::below(0.01));
        assert_eq!(parse_band("-4.6:").unwrap(), ScoreBand::at_least(-4.6));
        assert!(parse_band("25").is_err());
        assert!(parse_band("a:b").is_err());
    }

    #[test]
    fn test_named_categories_lower_to_bands() {
        assert_eq!(
            parse_cadd_band("probably_deleterious").unwrap(),
            ScoreBand::between(25.0, 30.0)
        );
        assert_eq!(
            parse_allele_freq_band("rare").unwrap(),
            ScoreBand::between(1e-4, 0.01)
        );
        assert_eq!(
            parse_popeve_band("likely_pathogenic").unwrap(),
            ScoreBand::below(-4.6)
        );
    }

    #[test]
    fn test_parse_am_class_accepts_codes_and_names() {
        assert_eq!(parse_am_class("-1").unwrap(), AmClass::LikelyBenign);
        assert_eq!(parse_am_class("pathogenic").unwrap(), AmClass::LikelyPathogenic);
        assert!(parse_am_class("2").is_err());
        assert!(parse_am_class("maybe").is_err());
    }
}
