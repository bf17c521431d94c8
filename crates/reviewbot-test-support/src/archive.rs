//! In-memory ZIP archive construction, shared by every crate that needs to
//! hand archive bytes to `reviewbot_archive::assemble_project` or to a
//! [`crate::mock_hosting::MockHosting`] archive endpoint.

use std::io::{Cursor, Write as _};

/// Build a ZIP archive from `(path, contents)` pairs. `path` is expected to
/// include the top-level `"<repo>-<version>/"` folder the hosting platform's
/// archive endpoint wraps every file in.
#[must_use]
pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (path, contents) in files {
            writer.start_file(*path, options).expect("in-memory zip write cannot fail");
            writer.write_all(contents.as_bytes()).expect("in-memory zip write cannot fail");
        }
        writer.finish().expect("in-memory zip finish cannot fail");
    }
    buf
}

/// A minimal single-module package archive: `elm.json` plus one `src/Main.elm`.
#[must_use]
pub fn minimal_package_archive(repo: &str, version: &str, manifest_json: &str) -> Vec<u8> {
    let folder = format!("{repo}-{version}");
    zip_archive(&[
        (&format!("{folder}/elm.json"), manifest_json),
        (&format!("{folder}/src/Main.elm"), "module Main exposing (..)\n"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_archive_round_trips_through_the_zip_crate() {
        let bytes = zip_archive(&[("pkg-1.0.0/elm.json", "{}")]);
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut file = archive.by_name("pkg-1.0.0/elm.json").unwrap();
        let mut contents = String::new();
        std::io::Read::read_to_string(&mut file, &mut contents).unwrap();
        assert_eq!(contents, "{}");
    }
}
