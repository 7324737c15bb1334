//! Fills an [`InMemoryStore`] from a directory of TSV relation files.
//!
//! Each relation lives in `<name>.tsv` or `<name>.tsv.gz` (gzip is sniffed
//! from the extension). Files are headerless, tab-separated, `#` starts a
//! comment line. The backbone mapping is required; every annotation file is
//! optional and absent files simply leave that relation empty.
//!
//! File layouts:
//!
//! | file | columns |
//! |---|---|
//! | `backbone.tsv` | chromosome, position, ref, accession, gene, ensembl gene, ensembl transcript, ensembl protein, protein position, codon, codon position, strand (+/-) |
//! | `cadd.tsv`, `allele_freq.tsv` | chromosome, position, ref, alt, score |
//! | `known_variants.tsv` | chromosome, position, ref, alt |
//! | `alpha_missense.tsv` | accession, protein position, mutant aa, score, class (-1/0/1) |
//! | `esm1b.tsv`, `popeve.tsv`, `foldx.tsv` | accession, protein position, mutant aa, score |
//! | `conservation.tsv` | accession, protein position, score |
//! | `structure_coverage.tsv` | pdb id, accession, start, end |
//! | `pocket.tsv`, `interaction.tsv` | accession, protein position |
//! | `refseq_crosswalk.tsv` | refseq id (versioned), accession |

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::read::MultiGzDecoder;
use log::debug;

use varmap_core::QueryError;
use varmap_core::models::backbone::BackboneRecord;
use varmap_core::models::base::Base;
use varmap_core::models::keys::{GenomicKey, ProteinKey, ResidueKey, ResidueRange};
use varmap_core::models::request::AmClass;

use crate::memory::InMemoryStore;

impl InMemoryStore {
    /// Load every relation file found under `dir`.
    pub fn from_data_dir(dir: impl AsRef<Path>) -> Result<InMemoryStore, QueryError> {
        let dir = dir.as_ref();
        let mut store = InMemoryStore::new();

        let Some(backbone) = open_relation(dir, "backbone")? else {
            return Err(QueryError::MissingBackbone(dir.display().to_string()));
        };
        load_backbone(backbone, &mut store)?;
        if store.backbone_len() == 0 {
            return Err(QueryError::MissingBackbone(dir.display().to_string()));
        }

        if let Some(reader) = open_relation(dir, "cadd")? {
            load_genomic_scores(reader, |key, score| store.set_cadd(key, score))?;
        }
        if let Some(reader) = open_relation(dir, "allele_freq")? {
            load_genomic_scores(reader, |key, score| store.set_allele_freq(key, score))?;
        }
        if let Some(reader) = open_relation(dir, "known_variants")? {
            load_known_variants(reader, &mut store)?;
        }
        if let Some(reader) = open_relation(dir, "alpha_missense")? {
            load_alpha_missense(reader, &mut store)?;
        }
        if let Some(reader) = open_relation(dir, "esm1b")? {
            load_protein_scores(reader, |key, score| store.set_esm1b(key, score))?;
        }
        if let Some(reader) = open_relation(dir, "popeve")? {
            load_protein_scores(reader, |key, score| store.set_popeve(key, score))?;
        }
        if let Some(reader) = open_relation(dir, "foldx")? {
            load_protein_scores(reader, |key, score| store.set_foldx_ddg(key, score))?;
        }
        if let Some(reader) = open_relation(dir, "conservation")? {
            load_conservation(reader, &mut store)?;
        }
        if let Some(reader) = open_relation(dir, "structure_coverage")? {
            load_structure_coverage(reader, &mut store)?;
        }
        if let Some(reader) = open_relation(dir, "pocket")? {
            load_residues(reader, |key| store.add_pocket(key))?;
        }
        if let Some(reader) = open_relation(dir, "interaction")? {
            load_residues(reader, |key| store.add_interaction(key))?;
        }
        if let Some(reader) = open_relation(dir, "refseq_crosswalk")? {
            load_refseq_crosswalk(reader, &mut store)?;
        }

        Ok(store)
    }
}

struct Relation {
    path: PathBuf,
    reader: BufReader<Box<dyn Read>>,
}

/// Open `<stem>.tsv` or `<stem>.tsv.gz` under `dir`, whichever exists.
fn open_relation(dir: &Path, stem: &str) -> Result<Option<Relation>, QueryError> {
    let plain = dir.join(format!("{}.tsv", stem));
    if plain.is_file() {
        let reader: Box<dyn Read> = Box::new(File::open(&plain)?);
        return Ok(Some(Relation {
            path: plain,
            reader: BufReader::new(reader),
        }));
    }
    let gzipped = dir.join(format!("{}.tsv.gz", stem));
    if gzipped.is_file() {
        let reader: Box<dyn Read> = Box::new(MultiGzDecoder::new(File::open(&gzipped)?));
        return Ok(Some(Relation {
            path: gzipped,
            reader: BufReader::new(reader),
        }));
    }
    debug!("no {} relation under {}, leaving it empty", stem, dir.display());
    Ok(None)
}

fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> QueryError {
    QueryError::MalformedRecord {
        path: path.display().to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_column<T>(fields: &[&str], index: usize, path: &Path, line: usize) -> Result<T, QueryError>
where
    T: FromStr,
{
    let raw = fields
        .get(index)
        .ok_or_else(|| malformed(path, line, format!("missing column {}", index + 1)))?;
    raw.parse()
        .map_err(|_| malformed(path, line, format!("bad value {:?} in column {}", raw, index + 1)))
}

fn for_each_row(
    relation: Relation,
    expected_columns: usize,
    mut handle: impl FnMut(&Path, usize, &[&str]) -> Result<(), QueryError>,
) -> Result<(), QueryError> {
    let Relation { path, reader } = relation;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split('\t').collect();
        if fields.len() < expected_columns {
            return Err(malformed(
                &path,
                line_number,
                format!(
                    "expected {} columns, found {}",
                    expected_columns,
                    fields.len()
                ),
            ));
        }
        handle(&path, line_number, &fields)?;
    }
    Ok(())
}

fn load_backbone(relation: Relation, store: &mut InMemoryStore) -> Result<(), QueryError> {
    for_each_row(relation, 12, |path, line, fields| {
        let strand = fields[11];
        let reverse_strand = match strand {
            "+" => false,
            "-" => true,
            other => return Err(malformed(path, line, format!("bad strand {:?}", other))),
        };
        store.add_backbone(BackboneRecord {
            chromosome: fields[0].to_string(),
            genomic_position: parse_column(fields, 1, path, line)?,
            reference_base: parse_column(fields, 2, path, line)?,
            accession: fields[3].to_string(),
            gene_name: fields[4].to_string(),
            ensembl_gene: fields[5].to_string(),
            ensembl_transcript: fields[6].to_string(),
            ensembl_protein: fields[7].to_string(),
            protein_position: parse_column(fields, 8, path, line)?,
            reference_codon: parse_column(fields, 9, path, line)?,
            codon_position: varmap_core::CodonPos::new(parse_column(fields, 10, path, line)?)
                .map_err(|e| malformed(path, line, e.to_string()))?,
            reverse_strand,
        });
        Ok(())
    })
}

fn genomic_key(fields: &[&str], path: &Path, line: usize) -> Result<GenomicKey, QueryError> {
    Ok(GenomicKey {
        chromosome: fields[0].to_string(),
        position: parse_column(fields, 1, path, line)?,
        reference: parse_column(fields, 2, path, line)?,
        alternate: parse_column(fields, 3, path, line)?,
    })
}

fn protein_key(fields: &[&str], path: &Path, line: usize) -> Result<ProteinKey, QueryError> {
    Ok(ProteinKey {
        accession: fields[0].to_string(),
        protein_position: parse_column(fields, 1, path, line)?,
        mutant_aa: parse_column(fields, 2, path, line)?,
    })
}

fn load_genomic_scores(
    relation: Relation,
    mut set: impl FnMut(GenomicKey, f64),
) -> Result<(), QueryError> {
    for_each_row(relation, 5, |path, line, fields| {
        let key = genomic_key(fields, path, line)?;
        set(key, parse_column(fields, 4, path, line)?);
        Ok(())
    })
}

fn load_known_variants(relation: Relation, store: &mut InMemoryStore) -> Result<(), QueryError> {
    for_each_row(relation, 4, |path, line, fields| {
        store.add_known_variant(genomic_key(fields, path, line)?);
        Ok(())
    })
}

fn load_alpha_missense(relation: Relation, store: &mut InMemoryStore) -> Result<(), QueryError> {
    for_each_row(relation, 5, |path, line, fields| {
        let key = protein_key(fields, path, line)?;
        let score = parse_column(fields, 3, path, line)?;
        let code: i8 = parse_column(fields, 4, path, line)?;
        let class = AmClass::from_code(code)
            .ok_or_else(|| malformed(path, line, format!("bad AM class code {}", code)))?;
        store.set_alpha_missense(key, score, class);
        Ok(())
    })
}

fn load_protein_scores(
    relation: Relation,
    mut set: impl FnMut(ProteinKey, f64),
) -> Result<(), QueryError> {
    for_each_row(relation, 4, |path, line, fields| {
        let key = protein_key(fields, path, line)?;
        set(key, parse_column(fields, 3, path, line)?);
        Ok(())
    })
}

fn load_conservation(relation: Relation, store: &mut InMemoryStore) -> Result<(), QueryError> {
    for_each_row(relation, 3, |path, line, fields| {
        let key = ResidueKey {
            accession: fields[0].to_string(),
            protein_position: parse_column(fields, 1, path, line)?,
        };
        store.set_conservation(key, parse_column(fields, 2, path, line)?);
        Ok(())
    })
}

fn load_structure_coverage(
    relation: Relation,
    store: &mut InMemoryStore,
) -> Result<(), QueryError> {
    for_each_row(relation, 4, |path, line, fields| {
        let range = ResidueRange {
            accession: fields[1].to_string(),
            start: parse_column(fields, 2, path, line)?,
            end: parse_column(fields, 3, path, line)?,
        };
        store.add_structure_coverage(fields[0], range);
        Ok(())
    })
}

fn load_residues(relation: Relation, mut add: impl FnMut(ResidueKey)) -> Result<(), QueryError> {
    for_each_row(relation, 2, |path, line, fields| {
        add(ResidueKey {
            accession: fields[0].to_string(),
            protein_position: parse_column(fields, 1, path, line)?,
        });
        Ok(())
    })
}

fn load_refseq_crosswalk(relation: Relation, store: &mut InMemoryStore) -> Result<(), QueryError> {
    for_each_row(relation, 2, |_path, _line, fields| {
        store.add_refseq_mapping(fields[0], fields[1]);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use pretty_assertions::assert_eq;

    use crate::predicate::BackbonePredicate;
    use crate::store::VariantStore;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_minimal_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "backbone.tsv",
            "# comment line\n\
             17\t7676154\tG\tP04637\tTP53\tENSG00000141510\tENST00000269305\tENSP00000269305\t175\tCGC\t2\t-\n",
        );
        write_file(dir.path(), "cadd.tsv", "17\t7676154\tG\tA\t24.7\n");
        write_file(dir.path(), "refseq_crosswalk.tsv", "NM_000546.5\tP04637\n");

        let store = InMemoryStore::from_data_dir(dir.path()).unwrap();
        assert_eq!(store.backbone_len(), 1);

        let rows = store
            .scan_backbone(&BackbonePredicate::GeneIn(vec!["TP53".to_string()]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].reverse_strand);

        let key = rows[0].genomic_key(varmap_core::models::base::Base::A);
        assert_eq!(store.cadd(&key).unwrap(), Some(24.7));
        assert_eq!(
            store.refseq_accessions("NM_000546").unwrap(),
            vec!["P04637".to_string()]
        );
    }

    #[test]
    fn test_missing_backbone_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = InMemoryStore::from_data_dir(dir.path()).unwrap_err();
        assert!(matches!(err, QueryError::MissingBackbone(_)));
    }

    #[test]
    fn test_malformed_row_names_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "backbone.tsv",
            "17\t7676154\tG\tP04637\tTP53\tENSG1\tENST1\tENSP1\t175\tCGC\t9\t-\n",
        );
        let err = InMemoryStore::from_data_dir(dir.path()).unwrap_err();
        match err {
            QueryError::MalformedRecord { line, reason, .. } => {
                assert_eq!(line, 1);
                assert!(reason.contains("codon position"), "got: {}", reason);
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }
}
