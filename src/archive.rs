use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{ExchangeError, Result};

const DATA_FILE_EXTENSION: &str = "xml";
const TEMP_PREFIX: &str = "exchange-catalog";

/// Catalog directory packed into a single zip archive.
///
/// The archive lives in its own temporary directory, which is removed
/// together with the archive when the value is dropped.
#[derive(Debug)]
pub struct PackedCatalog {
    dir: TempDir,
    path: PathBuf,
    data_files: Vec<String>,
}

impl PackedCatalog {
    /// Pack every file under `catalog` into an archive named `archive_name`
    /// and collect the archive-relative names of its XML data files.
    pub fn pack<P: AsRef<Path>>(
        catalog: P,
        archive_name: &str,
    ) -> Result<PackedCatalog> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()?;
        let path = dir.path().join(archive_name);
        let data_files = pack_catalog(catalog.as_ref(), &path)?;

        Ok(PackedCatalog {
            dir,
            path,
            data_files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data_files(&self) -> &[String] {
        &self.data_files
    }

    /// Remove the archive right away instead of waiting for the drop.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

/// Write all files found under `catalog` into a zip at `archive`.
///
/// Returns the entries having the `.xml` extension, relative to the
/// catalog root and separated by `/`.
pub fn pack_catalog(catalog: &Path, archive: &Path) -> Result<Vec<String>> {
    log::trace!(
        "Packing {} into {}",
        catalog.display(),
        archive.display()
    );

    let mut writer = ZipWriter::new(BufWriter::new(File::create(archive)?));
    let options =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut data_files = Vec::new();
    let entries = WalkDir::new(catalog)
        .follow_links(true)
        .sort_by_file_name();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(entry.path().strip_prefix(catalog)?)?;
        writer.start_file(name.as_str(), options)?;
        let mut source = File::open(entry.path())?;
        io::copy(&mut source, &mut writer)?;

        if is_data_file(entry.path()) {
            data_files.push(name);
        }
    }

    writer.finish()?;
    log::trace!("{} data files packed", data_files.len());

    Ok(data_files)
}

fn entry_name(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part
                .to_str()
                .map(str::to_owned)
                .ok_or(ExchangeError::Parse),
            _ => Err(ExchangeError::Input(format!(
                "Unexpected path in catalog: {}",
                relative.display()
            ))),
        })
        .collect::<Result<Vec<String>>>()?;
    Ok(parts.join("/"))
}

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension == DATA_FILE_EXTENSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    fn write_file(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn pack(catalog: &Path) -> PackedCatalog {
        PackedCatalog::pack(catalog, "catalog.zip").unwrap()
    }

    fn entries(packed: &PackedCatalog) -> Vec<String> {
        let archive =
            ZipArchive::new(File::open(packed.path()).unwrap()).unwrap();
        let mut names: Vec<String> =
            archive.file_names().map(str::to_owned).collect();
        names.sort();
        names
    }

    #[test]
    fn pack_archives_every_file_and_reports_xml() {
        let catalog = tempfile::tempdir().unwrap();
        write_file(catalog.path(), "import_1.xml", "<import/>");
        write_file(catalog.path(), "offers_1.xml", "<offers/>");
        write_file(catalog.path(), "readme.txt", "notes");
        write_file(catalog.path(), "import_files/ab/picture.jpg", "jpeg");
        write_file(catalog.path(), "goods/prices_1.xml", "<prices/>");

        let packed = pack(catalog.path());
        assert_eq!(packed.path().file_name().unwrap(), "catalog.zip");
        assert_eq!(
            packed.data_files(),
            ["goods/prices_1.xml", "import_1.xml", "offers_1.xml"]
        );

        assert_eq!(
            entries(&packed),
            vec![
                "goods/prices_1.xml",
                "import_1.xml",
                "import_files/ab/picture.jpg",
                "offers_1.xml",
                "readme.txt",
            ]
        );

        let mut archive =
            ZipArchive::new(File::open(packed.path()).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("import_1.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<import/>");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_packed() {
        let outside = tempfile::tempdir().unwrap();
        write_file(outside.path(), "export.xml", "<offers/>");

        let catalog = tempfile::tempdir().unwrap();
        write_file(catalog.path(), "import_1.xml", "<import/>");
        std::os::unix::fs::symlink(
            outside.path().join("export.xml"),
            catalog.path().join("offers_1.xml"),
        )
        .unwrap();

        let packed = pack(catalog.path());
        assert_eq!(packed.data_files(), ["import_1.xml", "offers_1.xml"]);
        assert_eq!(entries(&packed), vec!["import_1.xml", "offers_1.xml"]);

        let mut archive =
            ZipArchive::new(File::open(packed.path()).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("offers_1.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<offers/>");
    }

    #[test]
    fn pack_without_xml_reports_nothing() {
        let catalog = tempfile::tempdir().unwrap();
        write_file(catalog.path(), "import_1.XML.bak", "");
        write_file(catalog.path(), "notes.txt", "");

        let packed = pack(catalog.path());
        assert!(packed.data_files().is_empty());
        assert!(packed.path().exists());
    }

    #[test]
    fn archive_is_removed_on_drop() {
        let catalog = tempfile::tempdir().unwrap();
        write_file(catalog.path(), "import_1.xml", "<import/>");

        let packed = pack(catalog.path());
        let archive = packed.path().to_path_buf();
        assert!(archive.exists());

        drop(packed);
        assert!(!archive.exists());
        assert!(!archive.parent().unwrap().exists());
    }

    #[test]
    fn pack_missing_catalog_fails() {
        let root = tempfile::tempdir().unwrap();
        let result =
            PackedCatalog::pack(root.path().join("absent"), "catalog.zip");
        assert!(matches!(result, Err(ExchangeError::Walk(_))));
    }
}
