use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use fusor_explorer::analysis::pairwise::{InterruptSignal, PairwiseDistanceAnalyzer};
use fusor_explorer::analysis::stats::Statistics;
use fusor_explorer::data::filter::{DatasetView, EnergyBounds};
use fusor_explorer::data::model::{Dataset, Species};
use fusor_explorer::data::species::SpeciesClassifier;
use fusor_explorer::report::export_statistics;
use fusor_explorer::Error;

const TRIANGLE_CSV: &str = "\
x,y,z,vx,vy,vz,mass,charge
0,0,0,1e6,0,0,3.3436e-27,1.6e-19
1,0,0,0,2e6,0,1.6726e-27,1.6e-19
0,1,0,0,0,0,9.0e-27,0
";

fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn csv_to_statistics_and_distances() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "triangle.csv", TRIANGLE_CSV);
    let dataset = Dataset::load(&path, &SpeciesClassifier::default()).unwrap();
    assert_eq!(dataset.len(), 3);

    let species: Vec<Species> = dataset.particles().iter().map(|p| p.species).collect();
    assert_eq!(species, vec![Species::Deuterium, Species::Proton, Species::Unknown]);

    let view = DatasetView::all(&dataset);
    let stats = Statistics::compute(&view).unwrap();
    assert_eq!(stats.count, 3);
    let per_species: usize = stats.species.values().map(|s| s.count).sum();
    assert_eq!(per_species, stats.count);

    let histogram = PairwiseDistanceAnalyzer::default()
        .analyze(&view, &InterruptSignal::new(), &mut |_: u64, _: u64| {})
        .unwrap();
    // range [0, 2], 100 bins: 1, 1, sqrt(2)
    assert_eq!(histogram.total(), 3);
    assert_eq!(histogram.range(), (0.0, 2.0));
    assert_eq!(histogram.counts()[50], 2);
    assert_eq!(histogram.counts()[70], 1);

    let export = dir.path().join("stats.txt");
    export_statistics(&export, &stats).unwrap();
    let text = std::fs::read_to_string(export).unwrap();
    assert!(text.contains("Proton count: 1"));
}

#[test]
fn filtered_view_drives_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "triangle.csv", TRIANGLE_CSV);
    let dataset = Dataset::load(&path, &SpeciesClassifier::default()).unwrap();

    // deuteron ~10.4 keV, proton ~20.9 keV, the resting particle 0 keV
    let bounds = EnergyBounds::clamped(5.0, 15.0, dataset.max_energy_kev());
    let view = DatasetView::filtered(&dataset, &bounds);
    let stats = Statistics::compute(&view).unwrap();
    assert_eq!(stats.count, 1);
    assert!(stats.species.contains_key(&Species::Deuterium));

    let empty = DatasetView::filtered(&dataset, &EnergyBounds { min_kev: 12.0, max_kev: 13.0 });
    assert!(matches!(Statistics::compute(&empty), Err(Error::EmptyDataset)));
}

#[test]
fn missing_columns_are_all_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "bad.csv", "x,y,z,vx,vy\n1,2,3,4,5\n");
    match Dataset::load(&path, &SpeciesClassifier::default()) {
        Err(Error::Schema { missing }) => assert_eq!(missing, vec!["vz", "mass", "charge"]),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn json_records_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "p.json",
        r#"[{"x":0,"y":0,"z":0.01,"vx":0,"vy":0,"vz":-1e5,"mass":3.35e-27,"charge":1.6e-19,"id":7}]"#,
    );
    let dataset = Dataset::load(&path, &SpeciesClassifier::default()).unwrap();
    let p = &dataset.particles()[0];
    assert_eq!(p.species, Species::Deuterium);
    assert!(p.radial_velocity < 0.0);
}

#[test]
fn parquet_with_mixed_numeric_columns_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("p.parquet");

    let names = ["x", "y", "z", "vx", "vy", "vz", "mass", "charge"];
    let mut fields: Vec<Field> = names
        .iter()
        .map(|n| Field::new(*n, DataType::Float64, true))
        .collect();
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(vec![Some(0.0), Some(0.03)])),
        Arc::new(Float64Array::from(vec![Some(0.0), Some(0.04)])),
        Arc::new(Float64Array::from(vec![Some(0.0), None])),
        Arc::new(Float64Array::from(vec![1e6, 0.0])),
        Arc::new(Float64Array::from(vec![0.0, 0.0])),
        Arc::new(Float64Array::from(vec![0.0, 0.0])),
        Arc::new(Float64Array::from(vec![3.3436e-27, 1.6749e-27])),
        Arc::new(Float64Array::from(vec![1.6e-19, 0.0])),
    ];
    // extra integer column is ignored
    fields.push(Field::new("step", DataType::Int64, false));
    columns.push(Arc::new(Int64Array::from(vec![10, 10])));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let dataset = Dataset::load(&path, &SpeciesClassifier::default()).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.particles()[0].species, Species::Deuterium);
    assert_eq!(dataset.particles()[1].species, Species::Neutron);
    // null z reads as NaN and propagates into the radius
    assert!(dataset.particles()[1].radius.is_nan());
}

#[test]
fn unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "p.txt", TRIANGLE_CSV);
    assert!(matches!(
        Dataset::load(&path, &SpeciesClassifier::default()),
        Err(Error::UnsupportedFormat(ext)) if ext == "txt"
    ));
}
