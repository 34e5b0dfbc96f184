use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

// Kernel specification as written by `ipykernel install`
// DOCS: https://jupyter-client.readthedocs.io/en/latest/kernels.html#kernel-specs
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct KernelSpec {
    pub argv: Vec<String>,    // A list of command line arguments used to start the kernel
    pub display_name: String, // The kernel's name as it should be displayed in the UI
    pub language: String,     // The name of the language of the kernel
    pub env: Option<HashMap<String, String>>, // A dictionary of environment variables to set for the kernel
}

impl KernelSpec {
    /// Reads `kernel.json` from a kernel spec directory
    pub fn load(spec_dir: &Path) -> anyhow::Result<Self> {
        let path = spec_dir.join("kernel.json");
        let data = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path.display(), e))?;

        serde_json::from_str(&data)
            .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", path.display(), e))
    }
}
