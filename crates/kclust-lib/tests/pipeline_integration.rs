//! End-to-end pipeline tests over a synthetic protein corpus.

use kclust_lib::alphabet::Alphabet;
use kclust_lib::matcher::{run_matcher, MatcherConfiguration};
use kclust_lib::store::MemorySequenceStore;
use kclust_lib::writer::{FlatFileWriter, MemoryResultWriter, ResultWriter};
use std::collections::HashMap;
use tempfile::TempDir;

const AMINO: &[u8] = b"ARNDCQEGHILKMFPSTWYV";

/// Deterministic pseudo-random residue stream.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn residue(&mut self) -> u8 {
        AMINO[(self.next() % 20) as usize]
    }
}

/// A corpus of base sequences plus truncated and point-mutated copies,
/// so real groups exist alongside unrelated singletons.
fn build_corpus() -> (MemorySequenceStore, HashMap<u32, usize>) {
    let alphabet = Alphabet::amino_acid();
    let mut store = MemorySequenceStore::new();
    let mut lengths = HashMap::new();
    let mut rng = Lcg(7);
    let mut key = 0u32;

    let mut push = |store: &mut MemorySequenceStore,
                    lengths: &mut HashMap<u32, usize>,
                    key: &mut u32,
                    seq: &[u8]| {
        store.push_ascii(*key, &alphabet, seq);
        lengths.insert(*key, seq.len());
        *key += 1;
    };

    for family in 0..8 {
        let len = 60 + family * 10;
        let base: Vec<u8> = (0..len).map(|_| rng.residue()).collect();
        push(&mut store, &mut lengths, &mut key, &base);

        // Truncated copy: shares most windows with the base.
        push(&mut store, &mut lengths, &mut key, &base[..len - 7]);

        // Point-mutated copy.
        let mut mutated = base.clone();
        mutated[len / 2] = AMINO[(family * 3) % 20];
        push(&mut store, &mut lengths, &mut key, &mutated);
    }

    // Unrelated short sequences and one below the window length.
    for _ in 0..6 {
        let seq: Vec<u8> = (0..25).map(|_| rng.residue()).collect();
        push(&mut store, &mut lengths, &mut key, &seq);
    }
    push(&mut store, &mut lengths, &mut key, b"ARND");

    (store, lengths)
}

fn base_config(tmp: &TempDir) -> MatcherConfiguration {
    MatcherConfiguration {
        kmer_size: 8,
        kmers_per_sequence: 12,
        cov_threshold: 0.0,
        num_threads: 2,
        tmp_dirname: tmp.path().join("spill"),
        ..MatcherConfiguration::default()
    }
}

fn run(config: &MatcherConfiguration) -> (MemoryResultWriter, HashMap<u32, usize>) {
    let (mut store, lengths) = build_corpus();
    let mut writer = MemoryResultWriter::new();
    run_matcher(&mut store, config, None, &mut writer).unwrap();
    (writer, lengths)
}

fn member_pairs(writer: &MemoryResultWriter) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();
    for (key, body) in &writer.entries {
        for line in body.lines().skip(1) {
            let member: u32 = line.split('\t').next().unwrap().parse().unwrap();
            pairs.push((*key, member));
        }
    }
    pairs.sort_unstable();
    pairs
}

#[test]
fn every_sequence_appears_in_exactly_one_entry() {
    let tmp = TempDir::new().unwrap();
    let (writer, lengths) = run(&base_config(&tmp));

    let mut keys: Vec<u32> = writer.entries.iter().map(|(k, _)| *k).collect();
    keys.sort_unstable();
    let mut expected: Vec<u32> = lengths.keys().copied().collect();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}

#[test]
fn copies_cluster_under_their_base_sequence() {
    let tmp = TempDir::new().unwrap();
    let (writer, _) = run(&base_config(&tmp));
    let pairs = member_pairs(&writer);

    // Each family's base (key 3f) must pick up its truncated copy (3f+1).
    for family in 0..8u32 {
        let base = family * 3;
        assert!(
            pairs.contains(&(base, base + 1)),
            "family {} not grouped: {:?}",
            family,
            pairs
        );
    }
}

#[test]
fn representative_is_never_shorter_than_its_members() {
    let tmp = TempDir::new().unwrap();
    let (writer, lengths) = run(&base_config(&tmp));

    for (rep, member) in member_pairs(&writer) {
        assert!(
            lengths[&rep] >= lengths[&member],
            "representative {} ({}) shorter than member {} ({})",
            rep,
            lengths[&rep],
            member,
            lengths[&member]
        );
    }
}

#[test]
fn partition_count_does_not_change_the_result() {
    let tmp = TempDir::new().unwrap();
    let (single, _) = run(&base_config(&tmp));

    let partitioned_config = MatcherConfiguration {
        split_override: 4,
        ..base_config(&tmp)
    };
    let (partitioned, _) = run(&partitioned_config);

    assert_eq!(member_pairs(&single), member_pairs(&partitioned));
}

#[test]
fn coverage_threshold_prunes_short_members() {
    let tmp = TempDir::new().unwrap();
    let loose = run(&base_config(&tmp)).0;

    let strict_config = MatcherConfiguration {
        cov_threshold: 0.95,
        ..base_config(&tmp)
    };
    let strict = run(&strict_config).0;

    let loose_pairs = member_pairs(&loose);
    let strict_pairs = member_pairs(&strict);
    assert!(strict_pairs.len() < loose_pairs.len());
    // The truncated copies (len - 7 of 60+) survive a 0.85 ratio threshold
    // only when coverage allows; at 0.95 they must be gone.
    for family in 0..8u32 {
        let base = family * 3;
        assert!(!strict_pairs.contains(&(base, base + 1)));
    }
}

#[test]
fn flat_file_output_round_trips() {
    let tmp = TempDir::new().unwrap();
    let (mut store, lengths) = build_corpus();
    let path = tmp.path().join("result.tsv");
    let mut writer = FlatFileWriter::create(&path).unwrap();
    let stats = run_matcher(&mut store, &base_config(&tmp), None, &mut writer).unwrap();
    writer.finish().unwrap();

    assert_eq!(writer.entries(), stats.groups_written + stats.singletons_written);

    // One entry per sequence: a group for each representative, a
    // singleton for everything else.
    let content = std::fs::read_to_string(&path).unwrap();
    let headers = content.lines().filter(|l| l.starts_with('#')).count();
    assert_eq!(headers, lengths.len());
}
