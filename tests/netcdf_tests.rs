mod common;

use blockwise::netcdf_io::{describe_variables, read_labels, read_values, NetCDFWriter};
use blockwise::prelude::*;
use common::{random_labels, random_values, reference_label, same_partition};
use ndarray::{ArrayD, IxDyn};
use netcdf::{create, open, AttributeValue};
use std::path::Path;
use tempfile::tempdir;

fn write_fixture(path: &Path, labels: &ArrayD<i64>, values: &ArrayD<f64>) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("z", labels.shape()[0])
        .expect("Failed to add dimension z");
    file.add_dimension("y", labels.shape()[1])
        .expect("Failed to add dimension y");
    file.add_dimension("x", labels.shape()[2])
        .expect("Failed to add dimension x");

    let mut seg = file
        .add_variable::<i64>("seg", &["z", "y", "x"])
        .expect("Failed to add variable seg");
    seg.put(labels.view(), ..).expect("Failed to write seg");
    seg.put_attribute("long_name", "cell segmentation")
        .expect("Failed to add attribute");
    seg.put_attribute("scale_factor", 0.5f32)
        .expect("Failed to add attribute");

    let mut intensity = file
        .add_variable::<f64>("intensity", &["z", "y", "x"])
        .expect("Failed to add variable intensity");
    intensity
        .put(values.view(), ..)
        .expect("Failed to write intensity");
}

#[test]
fn test_read_variables() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("input.nc");
    let labels = random_labels(&[4, 6, 5], 0, 5, 80).mapv(i64::from);
    let values = random_values(&[4, 6, 5], 81);
    write_fixture(&file_path, &labels, &values);

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let summaries = describe_variables(&file);
    let seg = summaries
        .iter()
        .find(|v| v.name == "seg")
        .expect("seg not listed");
    assert_eq!(seg.shape(), vec![4, 6, 5]);
    assert_eq!(seg.dimensions[0].0, "z");

    assert_eq!(read_labels(&file, "seg").unwrap(), labels);
    assert_eq!(read_values(&file, "intensity").unwrap(), values);

    match read_labels(&file, "missing") {
        Err(BlockwiseError::VariableNotFound { var }) => assert_eq!(var, "missing"),
        other => panic!("expected VariableNotFound, got {:?}", other),
    }
}

#[test]
fn test_label_and_write_round_trip() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("input.nc");
    let output_path = temp_dir.path().join("components.nc");
    let labels = random_labels(&[6, 8, 7], 0, 3, 82).mapv(i64::from);
    let values = random_values(&[6, 8, 7], 83);
    write_fixture(&input_path, &labels, &values);

    let file = open(&input_path).expect("Failed to open NetCDF file");
    let data = read_labels(&file, "seg").unwrap();
    let mut components = ArrayD::<u64>::zeros(data.shape());
    let options = BlockOptions::new(vec![3, 3, 3]).with_threads(2);
    let result = label(&data.view(), components.view_mut(), true, &options).unwrap();

    NetCDFWriter::new(&file, &output_path)
        .write_labels(&components, "seg_components", "seg", "connected components")
        .unwrap();

    let written = open(&output_path).expect("Failed to open output file");
    let var = written
        .variable("seg_components")
        .expect("Variable not found");
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(dims, vec!["z", "y", "x"]);

    let stored_values = var.get_values::<u64, _>(..).unwrap();
    let stored = ArrayD::from_shape_vec(IxDyn(&[6, 8, 7]), stored_values).unwrap();
    assert_eq!(stored, components);
    let (expected, count) = reference_label(&labels, |v| v == 0);
    assert_eq!(result.max_id, count);
    assert!(same_partition(&stored, &expected));

    match var.attribute("long_name").map(|a| a.value()) {
        Some(Ok(AttributeValue::Str(s))) => assert_eq!(s, "cell segmentation"),
        other => panic!("long_name not copied: {:?}", other),
    }
    match var.attribute("description").map(|a| a.value()) {
        Some(Ok(AttributeValue::Str(s))) => assert_eq!(s, "connected components"),
        other => panic!("description missing: {:?}", other),
    }
    assert!(var.attribute("scale_factor").is_none());
    assert!(written.attribute("history").is_some());
}

#[test]
fn test_write_rejects_shape_mismatch() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("input.nc");
    let output_path = temp_dir.path().join("out.nc");
    let labels = random_labels(&[2, 3, 4], 0, 3, 84).mapv(i64::from);
    let values = random_values(&[2, 3, 4], 85);
    write_fixture(&input_path, &labels, &values);

    let file = open(&input_path).expect("Failed to open NetCDF file");
    let wrong = ArrayD::<u64>::zeros(IxDyn(&[2, 3, 5]));
    let err = NetCDFWriter::new(&file, &output_path)
        .write_labels(&wrong, "seg_relabeled", "seg", "consecutive relabeling")
        .unwrap_err();
    assert!(matches!(err, BlockwiseError::InvalidShape { .. }));
    assert!(!output_path.exists());
}
