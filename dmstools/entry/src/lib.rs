use anyhow::Result;

use dms_annot::lib_dms_annot;
use dms_logo::lib_dms_logo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Annot,
    Logo,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Annot => "dms-annot",
            Tool::Logo => "dms-logo",
        }
    }
}

/// Runs a tool in-process with its raw argument vector
///
/// # Example
///
/// ```rust, no_run
/// use dmstools::{lib, Tool};
///
/// let args = vec!["--regions".to_string(), "domains.csv".to_string()];
/// lib(Tool::Annot, args).unwrap();
/// ```
pub fn lib(tool: Tool, args: Vec<String>) -> Result<()> {
    log::info!("Running {} with args: {:?}", tool.name(), &args);

    match tool {
        Tool::Annot => lib_dms_annot(args),
        Tool::Logo => lib_dms_logo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(Tool::Annot.name(), "dms-annot");
        assert_eq!(Tool::Logo.name(), "dms-logo");
    }
}
