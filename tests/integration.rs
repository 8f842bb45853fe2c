mod common;

use std::fs;

use test_case::test_case;

use common::caterpillar;
use phylodiv::{
    CancellationToken, ConfigError, DiversityConfig, GroupSelection, OutputWriter, PhyloDivError,
    PhyloDiversity, PhyloTree, TreeError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tree_with_placeholder() -> PhyloTree {
    let mut builder = PhyloTree::builder();
    let a = builder.leaf(Some(1.0), &[("A", 2)]);
    let b = builder.leaf(Some(1.0), &[("B", 1)]);
    let x = builder.leaf(Some(5.0), &[("xxx", 4)]);
    builder.group("Empty");
    let inner = builder.join(a, b, Some(1.0));
    builder.join(inner, x, None);
    builder.build().unwrap()
}

fn run(tree: &PhyloTree, config: DiversityConfig) -> Result<phylodiv::DiversityReport, PhyloDivError> {
    Ok(PhyloDiversity::new(tree, config)?
        .run(&CancellationToken::new())?
        .complete()
        .expect("run is not cancelled"))
}

#[test]
fn options_drive_a_full_run() {
    init_tracing();
    let tree = caterpillar(10, 2);
    let config = DiversityConfig::from_options([
        ("iters", "40"),
        ("freq", "0.25"),
        ("rarefy", "T"),
        ("collect", "T"),
        ("processors", "2"),
        ("seed", "99"),
    ])
    .unwrap();

    let report = run(&tree, config).unwrap();
    assert_eq!(report.trials, 40);
    assert_eq!(report.groups, vec!["A", "B"]);

    // Both groups hold 10 sequences; a quarter of that gives an increment of 2.
    let depths: Vec<usize> = report
        .rarefaction
        .as_ref()
        .unwrap()
        .iter()
        .map(|row| row.num_sampled)
        .collect();
    assert_eq!(depths, vec![1, 2, 4, 6, 8, 10]);
    assert_eq!(report.collector.as_ref().unwrap().len(), depths.len());
}

#[test]
fn placeholder_and_empty_groups_are_never_analysed() {
    init_tracing();
    let tree = tree_with_placeholder();
    let report = run(&tree, DiversityConfig::default().with_seed(1)).unwrap();
    assert_eq!(report.groups, vec!["A", "B"]);
}

#[test]
fn unknown_names_are_dropped() {
    init_tracing();
    let tree = tree_with_placeholder();
    let config = DiversityConfig::default()
        .with_groups(GroupSelection::Named(vec!["B".into(), "Nope".into()]))
        .with_seed(1);
    let report = run(&tree, config).unwrap();
    assert_eq!(report.groups, vec!["B"]);
}

#[test_case(vec!["Nope"] ; "only unknown names")]
#[test_case(vec!["xxx"] ; "only the placeholder")]
fn selection_without_valid_groups_fails(names: Vec<&str>) {
    let tree = tree_with_placeholder();
    let config = DiversityConfig::default()
        .with_groups(GroupSelection::Named(names.into_iter().map(String::from).collect()));
    let err = run(&tree, config).unwrap_err();
    assert!(matches!(err, PhyloDivError::Config(ConfigError::NoValidGroups)), "{err}");
}

#[test]
fn requesting_an_empty_group_is_a_tree_error() {
    let tree = tree_with_placeholder();
    let config =
        DiversityConfig::default().with_groups(GroupSelection::Named(vec!["Empty".into()]));
    let err = run(&tree, config).unwrap_err();
    assert!(matches!(err, PhyloDivError::Tree(TreeError::EmptyGroup(ref name)) if name == "Empty"));
}

#[test]
fn multi_tree_runs_write_tagged_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let trees = vec![caterpillar(4, 1), caterpillar(6, 1)];
    let config = DiversityConfig::default()
        .with_rarefaction(true)
        .with_iterations(10)
        .with_seed(8);
    let mut writer = OutputWriter::new(dir.path(), "run");

    let written = PhyloDiversity::run_all(&trees, &config, &mut writer, &CancellationToken::new())
        .unwrap()
        .complete()
        .unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "run.1.phylodiv.summary",
            "run.1.phylodiv.rarefaction",
            "run.2.phylodiv.summary",
            "run.2.phylodiv.rarefaction",
        ]
    );

    let curve = fs::read_to_string(dir.path().join("run.2.phylodiv.rarefaction")).unwrap();
    let mut lines = curve.lines();
    assert_eq!(lines.next(), Some("numSampled\tA\tB"));
    assert_eq!(lines.next().map(|line| line.starts_with("1\t")), Some(true));
}
