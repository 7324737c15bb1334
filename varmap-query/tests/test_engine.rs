//! End-to-end tests for plan building and execution through the public
//! engine API, against an in-memory store fixture.
//!
//! The fixture carries two small genes:
//! - P05067 / APP on chromosome 21, residues 1 (codon AUG, positions
//!   1000-1002) and 2 (codon GCC, positions 1003-1005), forward strand.
//! - Q9NUW8 / TDP2 on chromosome 6, residue 1 (codon CGU, positions
//!   2000-2002), forward strand.

use pretty_assertions::assert_eq;

use varmap_core::QueryError;
use varmap_core::codon::{AminoAcid, CodonPos};
use varmap_core::models::backbone::BackboneRecord;
use varmap_core::models::base::Base;
use varmap_core::models::keys::{GenomicKey, ProteinKey, ResidueKey, ResidueRange};
use varmap_core::models::request::{
    AmClass, FilterSpec, ScoreBand, SearchRequest, SearchTerm, SortKey, SortSpec, StabilityClass,
};
use varmap_query::{InMemoryStore, SearchEngine};

fn backbone_row(
    accession: &str,
    gene: &str,
    suffix: &str,
    chromosome: &str,
    position: u32,
    reference_base: Base,
    protein_position: u32,
    codon: &str,
    codon_position: u8,
) -> BackboneRecord {
    BackboneRecord {
        chromosome: chromosome.to_string(),
        genomic_position: position,
        reference_base,
        accession: accession.to_string(),
        gene_name: gene.to_string(),
        ensembl_gene: format!("ENSG000000000{}", suffix),
        ensembl_transcript: format!("ENST000000000{}", suffix),
        ensembl_protein: format!("ENSP000000000{}", suffix),
        protein_position,
        reference_codon: codon.parse().unwrap(),
        codon_position: CodonPos::new(codon_position).unwrap(),
        reverse_strand: false,
    }
}

fn genomic(chromosome: &str, position: u32, reference: Base, alternate: Base) -> GenomicKey {
    GenomicKey {
        chromosome: chromosome.to_string(),
        position,
        reference,
        alternate,
    }
}

fn protein(accession: &str, protein_position: u32, mutant_aa: AminoAcid) -> ProteinKey {
    ProteinKey {
        accession: accession.to_string(),
        protein_position,
        mutant_aa,
    }
}

fn residue(accession: &str, protein_position: u32) -> ResidueKey {
    ResidueKey {
        accession: accession.to_string(),
        protein_position,
    }
}

/// Two genes, ten annotation relations, one crosswalk entry.
fn fixture_store() -> InMemoryStore {
    let mut store = InMemoryStore::new();

    // P05067 residue 1: AUG at 21:1000-1002
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1000, Base::A, 1, "AUG", 1));
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1001, Base::T, 1, "AUG", 2));
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1002, Base::G, 1, "AUG", 3));
    // P05067 residue 2: GCC at 21:1003-1005
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1003, Base::G, 2, "GCC", 1));
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1004, Base::C, 2, "GCC", 2));
    store.add_backbone(backbone_row("P05067", "APP", "01", "21", 1005, Base::C, 2, "GCC", 3));
    // Q9NUW8 residue 1: CGU at 6:2000-2002
    store.add_backbone(backbone_row("Q9NUW8", "TDP2", "02", "6", 2000, Base::C, 1, "CGU", 1));
    store.add_backbone(backbone_row("Q9NUW8", "TDP2", "02", "6", 2001, Base::G, 1, "CGU", 2));
    store.add_backbone(backbone_row("Q9NUW8", "TDP2", "02", "6", 2002, Base::T, 1, "CGU", 3));

    store.set_cadd(genomic("21", 1000, Base::A, Base::G), 27.5);
    store.set_cadd(genomic("21", 1000, Base::A, Base::C), 12.0);
    store.set_cadd(genomic("6", 2000, Base::C, Base::T), 29.0);

    store.set_allele_freq(genomic("21", 1000, Base::A, Base::G), 0.002);
    store.set_allele_freq(genomic("6", 2000, Base::C, Base::T), 0.2);

    store.add_known_variant(genomic("21", 1000, Base::A, Base::G));

    // A>G at 21:1000 turns AUG into GUG = Val; A>C turns it into CUG = Leu
    store.set_alpha_missense(protein("P05067", 1, AminoAcid::Val), 0.9, AmClass::LikelyPathogenic);
    store.set_alpha_missense(protein("P05067", 1, AminoAcid::Leu), 0.2, AmClass::LikelyBenign);

    store.set_esm1b(protein("P05067", 1, AminoAcid::Val), -12.3);
    store.set_popeve(protein("P05067", 1, AminoAcid::Val), -5.0);
    store.set_foldx_ddg(protein("P05067", 1, AminoAcid::Val), 3.5);

    store.set_conservation(residue("P05067", 1), 0.95);

    store.add_structure_coverage(
        "1ABC",
        ResidueRange {
            accession: "P05067".to_string(),
            start: 1,
            end: 2,
        },
    );
    store.add_pocket(residue("P05067", 1));
    store.add_interaction(residue("Q9NUW8", 1));

    store.add_refseq_mapping("NM_000484.4", "P05067");

    store
}

fn request_for(terms: Vec<SearchTerm>) -> SearchRequest {
    SearchRequest {
        search_terms: terms,
        page_size: 100,
        ..Default::default()
    }
}

#[test]
fn test_unconstrained_request_is_rejected() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let err = engine.search(&SearchRequest::default()).unwrap_err();
    assert!(matches!(err, QueryError::UnconstrainedQuery));
    let err = engine.export(&SearchRequest::default()).unwrap_err();
    assert!(matches!(err, QueryError::UnconstrainedQuery));
}

#[test]
fn test_page_numbers_are_one_based() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        page: 0,
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    assert!(matches!(
        engine.search(&request).unwrap_err(),
        QueryError::InvalidPage(0)
    ));
}

#[test]
fn test_every_backbone_row_expands_to_three_alternates() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let page = engine
        .search(&request_for(vec![SearchTerm::uniprot("P05067")]))
        .unwrap();
    // 6 backbone rows × 3 alternates, no duplicates
    assert_eq!(page.total_elements, 18);
    for variant in &page.content {
        assert_ne!(variant.reference_base, variant.alternate_base);
    }
}

#[test]
fn test_uniprot_terms_or_combine() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let page = engine
        .search(&request_for(vec![
            SearchTerm::uniprot("P05067"),
            SearchTerm::uniprot("Q9NUW8"),
        ]))
        .unwrap();
    assert_eq!(page.total_elements, 27);
    let accessions: std::collections::HashSet<&str> =
        page.content.iter().map(|v| v.accession.as_str()).collect();
    assert_eq!(accessions.len(), 2);
}

#[test]
fn test_gene_and_uniprot_terms_and_combine() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    // APP only carries P05067, so the conjunction with Q9NUW8 is empty
    let page = engine
        .search(&request_for(vec![
            SearchTerm::uniprot("Q9NUW8"),
            SearchTerm::gene("APP"),
        ]))
        .unwrap();
    assert_eq!(page.total_elements, 0);
    assert_eq!(page.content.len(), 0);
}

#[test]
fn test_cadd_band_scenario_is_deterministic() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        search_terms: vec![SearchTerm::uniprot("P05067")],
        filters: FilterSpec {
            cadd: vec![ScoreBand::between(25.0, 30.0)],
            ..Default::default()
        },
        page: 1,
        page_size: 10,
        ..Default::default()
    };
    let first = engine.search(&request).unwrap();
    assert_eq!(first.total_elements, 1);
    assert!(first.content.len() <= 10);
    for variant in &first.content {
        assert_eq!(variant.accession, "P05067");
        let cadd = variant.scores.cadd.unwrap();
        assert!((25.0..30.0).contains(&cadd));
    }
    let second = engine.search(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_allele_freq_filter_first_band() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            allele_freq: vec![ScoreBand::between(0.05, 1.0)],
            ..Default::default()
        },
        page_size: 100,
        ..Default::default()
    };
    let page = engine.search(&request).unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].to_string(), "6 2000 C T");
    assert_eq!(page.content[0].scores.allele_freq, Some(0.2));
}

#[test]
fn test_popeve_filter_first_seeds_through_codon_substitution() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            popeve: vec![ScoreBand::below(-4.6)],
            ..Default::default()
        },
        page_size: 100,
        ..Default::default()
    };
    let page = engine.search(&request).unwrap();
    // only the A>G substitution at 21:1000 yields Val at P05067 residue 1
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].to_string(), "21 1000 A G");
    assert_eq!(page.content[0].mutant_amino_acid, Some(AminoAcid::Val));
}

#[test]
fn test_pagination_partitions_the_result() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let base_request = request_for(vec![SearchTerm::uniprot("P05067")]);

    let full = engine.search(&base_request).unwrap();
    assert_eq!(full.total_elements, 18);

    let mut paged = Vec::new();
    for page_number in 1.. {
        let request = SearchRequest {
            page: page_number,
            page_size: 5,
            ..base_request.clone()
        };
        let page = engine.search(&request).unwrap();
        if page.content.is_empty() {
            break;
        }
        paged.extend(page.content);
    }
    assert_eq!(paged, full.content);
}

#[test]
fn test_export_matches_interactive_pages() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = request_for(vec![SearchTerm::uniprot("P05067")]);
    let exported = engine.export(&request).unwrap();
    let interactive = engine.search(&request).unwrap();
    assert_eq!(exported, interactive.content);
}

#[test]
fn test_cadd_desc_sort_orders_nulls_last() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        sort: SortSpec::descending(SortKey::Cadd),
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    let page = engine.search(&request).unwrap();
    // the sort-only LEFT join must not drop unannotated rows
    assert_eq!(page.total_elements, 18);

    let scores: Vec<Option<f64>> = page.content.iter().map(|v| v.scores.cadd).collect();
    assert_eq!(&scores[..2], &[Some(27.5), Some(12.0)]);
    assert!(scores[2..].iter().all(|s| s.is_none()));
}

#[test]
fn test_ensembl_search_ignores_version_suffix() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let page = engine
        .search(&request_for(vec![SearchTerm::ensembl("ENST00000000001.7")]))
        .unwrap();
    assert_eq!(page.total_elements, 18);
}

#[test]
fn test_malformed_ensembl_term_keeps_valid_siblings() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let page = engine
        .search(&request_for(vec![
            SearchTerm::ensembl("not-an-id"),
            SearchTerm::ensembl("ENSG00000000002"),
        ]))
        .unwrap();
    assert_eq!(page.total_elements, 9);
    assert!(page.content.iter().all(|v| v.accession == "Q9NUW8"));
}

#[test]
fn test_pdb_search_constrains_to_covered_residues() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let page = engine
        .search(&request_for(vec![SearchTerm::pdb("1abc")]))
        .unwrap();
    // 1ABC covers P05067 residues 1-2, which is all six backbone rows
    assert_eq!(page.total_elements, 18);
    assert!(page.content.iter().all(|v| v.accession == "P05067"));
}

#[test]
fn test_refseq_search_resolves_through_crosswalk() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);

    let page = engine
        .search(&request_for(vec![SearchTerm::refseq("NM_000484")]))
        .unwrap();
    assert_eq!(page.total_elements, 18);

    // wrong version short-circuits to an empty page
    let page = engine
        .search(&request_for(vec![SearchTerm::refseq("NM_000484.9")]))
        .unwrap();
    assert_eq!(page.total_elements, 0);
    assert_eq!(page.content.len(), 0);
}

#[test]
fn test_am_class_filter_keys_off_mutant_amino_acid() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            am: vec![AmClass::LikelyPathogenic],
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    let page = engine.search(&request).unwrap();
    assert_eq!(page.total_elements, 1);
    let variant = &page.content[0];
    assert_eq!(variant.to_string(), "21 1000 A G");
    assert_eq!(variant.mutant_amino_acid, Some(AminoAcid::Val));
    assert_eq!(variant.scores.am, Some(0.9));
    assert_eq!(variant.scores.am_class, Some(AmClass::LikelyPathogenic));
}

#[test]
fn test_stability_filter_derives_classes_from_ddg() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            stability: vec![StabilityClass::LikelyDestabilising],
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    let page = engine.search(&request).unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].scores.foldx_ddg, Some(3.5));
}

#[test]
fn test_structural_flags_restrict_by_residue() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);

    let pocket_request = SearchRequest {
        filters: FilterSpec {
            pocket: true,
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    // pocket covers residue 1 only: 3 positions × 3 alternates
    assert_eq!(engine.search(&pocket_request).unwrap().total_elements, 9);

    let coverage_request = SearchRequest {
        filters: FilterSpec {
            experimental_model: true,
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    assert_eq!(engine.search(&coverage_request).unwrap().total_elements, 18);
}

#[test]
fn test_known_variant_filter() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            known: true,
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    let page = engine.search(&request).unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].to_string(), "21 1000 A G");
}

#[test]
fn test_conservation_filter_is_residue_keyed() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    let request = SearchRequest {
        filters: FilterSpec {
            conservation_min: Some(0.9),
            ..Default::default()
        },
        ..request_for(vec![SearchTerm::uniprot("P05067")])
    };
    // residue 1 is conserved, residue 2 has no conservation row
    assert_eq!(engine.search(&request).unwrap().total_elements, 9);
}

#[test]
fn test_filters_compose_across_levels() {
    let store = fixture_store();
    let engine = SearchEngine::new(&store);
    // known + pathogenic AM + destabilising, all on the same variant
    let request = SearchRequest {
        filters: FilterSpec {
            known: true,
            am: vec![AmClass::LikelyPathogenic],
            stability: vec![StabilityClass::LikelyDestabilising],
            allele_freq: vec![ScoreBand::below(0.01)],
            ..Default::default()
        },
        page_size: 100,
        ..Default::default()
    };
    let page = engine.search(&request).unwrap();
    assert_eq!(page.total_elements, 1);
    let variant = &page.content[0];
    assert_eq!(variant.to_string(), "21 1000 A G");
    assert_eq!(variant.scores.allele_freq, Some(0.002));
    assert_eq!(variant.scores.am_class, Some(AmClass::LikelyPathogenic));
}
