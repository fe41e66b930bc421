//! The `.wellheader` document: descriptive constants grouped into General
//! and Remarks, plus one nested header per logging run.
//!
//! Run constants are addressed from outside as `Run_<n>_<name>` with `n`
//! counting from 1.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use welllog_model::Constant;

use crate::dialect::{self, Element};
use crate::error::{PetrologError, Result};

/// Root element of a well-header document.
pub const WELL_HEADER_ROOT: &str = "WellHeader";

const RUN_PREFIX: &str = "Run_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellHeader {
    pub version: String,
    pub general: Vec<Constant>,
    pub remarks: Vec<Constant>,
    pub runs: Vec<WellHeader>,
}

impl WellHeader {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PetrologError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| PetrologError::MalformedHeader {
            path: path.to_path_buf(),
            field: WELL_HEADER_ROOT.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root = dialect::parse(text)?;
        if root.name != WELL_HEADER_ROOT {
            return Err(PetrologError::Dialect {
                position: 0,
                reason: format!("expected <{WELL_HEADER_ROOT}>, found <{}>", root.name),
            });
        }
        Ok(Self::from_element(&root))
    }

    fn from_element(element: &Element) -> Self {
        let constants = |group: &str| -> Vec<Constant> {
            element
                .child(group)
                .map(|g| g.children_named("Constant").map(constant_from_element).collect())
                .unwrap_or_default()
        };
        Self {
            version: element.child_text("Version").unwrap_or_default().to_string(),
            general: constants("General"),
            remarks: constants("Remarks"),
            runs: element
                .child("Runs")
                .map(|r| r.children_named("Run").map(Self::from_element).collect())
                .unwrap_or_default(),
        }
    }

    fn to_element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        if !self.version.is_empty() {
            element.push_leaf("Version", self.version.as_str());
        }
        element.push(constants_element("General", &self.general));
        if !self.runs.is_empty() {
            let mut runs = Element::new("Runs");
            for run in &self.runs {
                runs.push(run.to_element("Run"));
            }
            element.push(runs);
        }
        element.push(constants_element("Remarks", &self.remarks));
        element
    }

    pub fn to_document(&self) -> String {
        self.to_element(WELL_HEADER_ROOT).to_document()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_document();
        crate::rewrite::replace_file(path, |w| Ok(w.write_all(text.as_bytes())?))
    }

    /// Look up a constant, resolving `Run_<n>_` into the runs.
    pub fn constant(&self, name: &str) -> Option<&Constant> {
        if let Some((run, rest)) = split_run_prefix(name) {
            return self.runs.get(run - 1)?.constant(rest);
        }
        self.general
            .iter()
            .chain(self.remarks.iter())
            .find(|c| c.name == name)
    }

    /// Assign a constant, resolving `Run_<n>_` and creating runs up to `n`.
    ///
    /// A new name of the form `R<digits>` with a non-zero number is filed
    /// under Remarks, any other new name under General.
    pub fn set_constant(&mut self, name: &str, value: &str) {
        if let Some((run, rest)) = split_run_prefix(name) {
            if self.runs.len() < run {
                self.runs.resize_with(run, WellHeader::default);
            }
            self.runs[run - 1].set_constant(rest, value);
            return;
        }

        if let Some(existing) = self
            .general
            .iter_mut()
            .chain(self.remarks.iter_mut())
            .find(|c| c.name == name)
        {
            existing.value = value.to_string();
            return;
        }

        let constant = Constant::new(name, value);
        if is_remark_name(name) {
            self.remarks.push(constant);
        } else {
            self.general.push(constant);
        }
    }

    /// Every constant, run constants prefixed with `Run_<n>_`.
    pub fn flatten(&self) -> Vec<Constant> {
        let mut all: Vec<Constant> = self.general.iter().chain(&self.remarks).cloned().collect();
        for (i, run) in self.runs.iter().enumerate() {
            for mut constant in run.flatten() {
                constant.name = format!("{RUN_PREFIX}{}_{}", i + 1, constant.name);
                all.push(constant);
            }
        }
        all
    }
}

/// Split `Run_<n>_<rest>` into `(n, rest)`; `n` must be at least 1.
fn split_run_prefix(name: &str) -> Option<(usize, &str)> {
    let tail = name.strip_prefix(RUN_PREFIX)?;
    let (digits, rest) = tail.split_once('_')?;
    if digits.is_empty() || rest.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let run: usize = digits.parse().ok()?;
    (run > 0).then_some((run, rest))
}

/// `R` followed only by digits whose value is above zero.
fn is_remark_name(name: &str) -> bool {
    name.strip_prefix('R').is_some_and(|digits| {
        !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits.bytes().any(|b| b != b'0')
    })
}

fn constant_from_element(element: &Element) -> Constant {
    let text = |tag: &str| element.child_text(tag).unwrap_or_default();
    Constant::new(text("Name"), text("Value"))
        .with_unit(text("Unit"))
        .with_description(text("Description"))
}

fn constants_element(name: &str, constants: &[Constant]) -> Element {
    let mut group = Element::new(name);
    for c in constants {
        let mut element = Element::new("Constant");
        element
            .push_leaf("Name", c.name.as_str())
            .push_leaf("Unit", c.unit.as_str())
            .push_leaf("Value", c.value.as_str())
            .push_leaf("Description", c.description.as_str());
        group.push(element);
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WellHeader {
        let mut wh = WellHeader::new();
        wh.set_constant("COMP", "Acme Drilling");
        wh.set_constant("WELL", "A-1");
        wh.set_constant("R1", "Logged through casing");
        wh.set_constant("Run_1_BHT", "187.5");
        wh.set_constant("Run_2_BS", "8.5");
        wh
    }

    #[test]
    fn test_remark_classification() {
        let wh = sample();
        assert_eq!(wh.general.len(), 2);
        assert_eq!(wh.remarks.len(), 1);

        let mut wh = WellHeader::new();
        for name in ["R1", "R02", "R10"] {
            wh.set_constant(name, "x");
        }
        for name in ["R0", "R", "RX1", "r1", "R1A", "REMARK"] {
            wh.set_constant(name, "x");
        }
        let remarks: Vec<_> = wh.remarks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(remarks, vec!["R1", "R02", "R10"]);
        assert_eq!(wh.general.len(), 6);
    }

    #[test]
    fn test_existing_constant_keeps_its_group() {
        let mut wh = WellHeader::new();
        wh.general.push(Constant::new("R5", "general remark"));
        wh.set_constant("R5", "updated");
        assert_eq!(wh.general[0].value, "updated");
        assert!(wh.remarks.is_empty());
    }

    #[test]
    fn test_run_prefix_lookup() {
        let wh = sample();
        assert_eq!(wh.runs.len(), 2);
        assert_eq!(wh.constant("Run_1_BHT").unwrap().as_f64(), 187.5);
        assert_eq!(wh.constant("Run_2_BS").unwrap().value, "8.5");
        assert!(wh.constant("Run_3_BS").is_none());
        assert!(wh.constant("Run_0_BS").is_none());
        assert!(wh.constant("BHT").is_none());
        assert_eq!(wh.constant("R1").unwrap().value, "Logged through casing");
        assert!(wh.runs[0].constant("BHT").is_some());
    }

    #[test]
    fn test_prefix_parsing() {
        assert_eq!(split_run_prefix("Run_3_Depth_Max"), Some((3, "Depth_Max")));
        assert_eq!(split_run_prefix("Run_x_A"), None);
        assert_eq!(split_run_prefix("Run_1_"), None);
        assert_eq!(split_run_prefix("Run_0_A"), None);
        assert_eq!(split_run_prefix("Runner"), None);
    }

    #[test]
    fn test_flatten() {
        let names: Vec<_> = sample().flatten().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["COMP", "WELL", "R1", "Run_1_BHT", "Run_2_BS"]);
    }

    #[test]
    fn test_document_round_trip() {
        let mut wh = sample();
        wh.set_constant("FLD", "North <Sea> & Co");
        wh.general[0].unit = "".into();
        wh.general[1].description = "Well name".into();

        let text = wh.to_document();
        assert!(text.contains("North &lt;Sea&gt; &amp; Co"));
        assert!(text.contains("\n  <General>\n    <Constant>\n      <Name>COMP</Name>\n"));
        assert_eq!(WellHeader::parse(&text).unwrap(), wh);
    }

    #[test]
    fn test_wrong_root() {
        assert!(WellHeader::parse("<PetrologHeader/>").is_err());
    }
}
