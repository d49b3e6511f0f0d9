//! NetCDF I/O for the command-line tool
//!
//! Loads a whole variable into an ndarray for the block engine and writes label
//! results back out next to the variable's dimensions and string attributes.

use crate::errors::{BlockwiseError, Result};
use chrono::Utc;
use ndarray::ArrayD;
use netcdf::{create, AttributeValue, File, Variable};
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Name and shape of one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSummary {
    pub name: String,
    pub dimensions: Vec<(String, usize)>,
}

impl VariableSummary {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|(_, len)| *len).collect()
    }
}

/// Lists all variables with their dimensions.
pub fn describe_variables(file: &File) -> Vec<VariableSummary> {
    file.variables()
        .map(|var| VariableSummary {
            name: var.name(),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| (d.name(), d.len()))
                .collect(),
        })
        .collect()
}

fn find_variable<'f>(file: &'f File, var_name: &str) -> Result<Variable<'f>> {
    file.variable(var_name)
        .ok_or_else(|| BlockwiseError::VariableNotFound {
            var: var_name.to_string(),
        })
}

fn variable_shape(var: &Variable<'_>) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

/// Reads a variable as signed labels, so negative values reach the engine.
pub fn read_labels(file: &File, var_name: &str) -> Result<ArrayD<i64>> {
    let var = find_variable(file, var_name)?;
    let shape = variable_shape(&var);
    debug!(variable = var_name, shape = ?shape, "loading label variable");
    let data = var.get_values::<i64, _>(..)?;
    Ok(ArrayD::from_shape_vec(shape, data)?)
}

/// Reads a variable as intensities.
pub fn read_values(file: &File, var_name: &str) -> Result<ArrayD<f64>> {
    let var = find_variable(file, var_name)?;
    let shape = variable_shape(&var);
    debug!(variable = var_name, shape = ?shape, "loading intensity variable");
    let data = var.get_values::<f64, _>(..)?;
    Ok(ArrayD::from_shape_vec(shape, data)?)
}

/// Writes label arrays computed from a variable of `input_file`
pub struct NetCDFWriter<'a> {
    input_file: &'a File,
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    pub fn new(input_file: &'a File, output_path: &'a Path) -> Self {
        Self {
            input_file,
            output_path,
        }
    }

    /// Write `data` as `var_name` using the dimensions of `original_var_name`.
    ///
    /// String attributes of the original variable are copied; numeric ones are
    /// dropped since they describe the original values, not the labels.
    pub fn write_labels(
        &self,
        data: &ArrayD<u64>,
        var_name: &str,
        original_var_name: &str,
        description: &str,
    ) -> Result<()> {
        let orig_var = find_variable(self.input_file, original_var_name)?;
        let dims: Vec<(String, usize)> = orig_var
            .dimensions()
            .iter()
            .map(|d| (d.name(), d.len()))
            .collect();
        let dim_shape: Vec<usize> = dims.iter().map(|(_, len)| *len).collect();
        if dim_shape.as_slice() != data.shape() {
            return Err(BlockwiseError::invalid_shape(format!(
                "result shape {:?} does not match variable '{}' shape {:?}",
                data.shape(),
                original_var_name,
                dim_shape
            )));
        }

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        let mut file = create(self.output_path)?;

        for (dim_name, dim_len) in &dims {
            file.add_dimension(dim_name, *dim_len)?;
        }

        let dim_refs: Vec<&str> = dims.iter().map(|(name, _)| name.as_str()).collect();
        let mut new_var = file.add_variable::<u64>(var_name, &dim_refs)?;
        new_var.put(data.view(), ..)?;

        for attr in orig_var.attributes() {
            match attr.value()? {
                AttributeValue::Str(val) => {
                    new_var.put_attribute(attr.name(), val)?;
                }
                AttributeValue::Strs(vals) => {
                    new_var.put_attribute(attr.name(), vals)?;
                }
                _ => {
                    warn!(attribute = attr.name(), "skipped non-string attribute");
                }
            }
        }
        new_var.put_attribute("description", description)?;

        file.add_attribute(
            "history",
            format!("Created by blockwise on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}
