// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Packaging — ZIP archives of converted documents and their images, and
// self-contained HTML download links.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pdf_converter_core::error::{ConverterError, Result};
use pdf_converter_core::types::OutputKind;
use tracing::{debug, info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Directory inside the archive that holds extracted images.
pub const ARCHIVE_IMAGE_DIR: &str = "images";

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}

fn archive_err(context: &str, err: zip::result::ZipError) -> ConverterError {
    ConverterError::Archive(format!("{}: {}", context, err))
}

/// Write a Markdown file and its image folder into one archive at `dest`.
///
/// The Markdown sits at the archive root under its own file name; every file
/// in `image_folder` (subfolders included) is flattened into `images/`.
/// Either input may be missing, in which case it is left out.
#[instrument(skip_all, fields(markdown = %markdown_path.display(), dest = %dest.display()))]
pub fn zip_markdown_with_images(markdown_path: &Path, image_folder: &Path, dest: &Path) -> Result<PathBuf> {
    let mut zip = ZipWriter::new(File::create(dest)?);

    if markdown_path.is_file() {
        let name = file_name(markdown_path)?;
        add_file(&mut zip, markdown_path, &name)?;
    }

    let mut images = 0usize;
    if image_folder.is_dir() {
        for path in list_files(image_folder)? {
            let name = format!("{}/{}", ARCHIVE_IMAGE_DIR, file_name(&path)?);
            add_file(&mut zip, &path, &name)?;
            images += 1;
        }
    }

    zip.finish().map_err(|err| archive_err("cannot finish archive", err))?;
    info!(images, "markdown bundle written");
    Ok(dest.to_path_buf())
}

/// Archive the contents of `folder` as `<folder>.zip`, paths relative to it.
#[instrument(skip_all, fields(folder = %folder.display()))]
pub fn zip_folder(folder: &Path) -> Result<PathBuf> {
    let mut dest = folder.as_os_str().to_owned();
    dest.push(".zip");
    let dest = PathBuf::from(dest);

    let mut zip = ZipWriter::new(File::create(&dest)?);
    let files = if folder.is_dir() { list_files(folder)? } else { Vec::new() };
    for path in &files {
        let relative = path.strip_prefix(folder).unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        add_file(&mut zip, path, &name)?;
    }
    zip.finish().map_err(|err| archive_err("cannot finish archive", err))?;

    info!(files = files.len(), archive = %dest.display(), "folder archived");
    Ok(dest)
}

/// An HTML anchor that embeds the file as a base64 data URI.
///
/// The MIME type follows the file extension; unknown extensions are served
/// as `application/octet-stream`.
pub fn download_link(path: &Path, link_text: &str) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputKind::from_extension)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    let name = file_name(path)?;

    debug!(%name, mime, bytes = bytes.len(), "building download link");
    Ok(format!(
        r#"<a href="data:file/{mime};base64,{}" download="{name}">{link_text}</a>"#,
        BASE64.encode(bytes)
    ))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ConverterError::Archive(format!("{} has no file name", path.display())))
}

fn add_file(zip: &mut ZipWriter<File>, path: &Path, name: &str) -> Result<()> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    zip.start_file(name, options())
        .map_err(|err| archive_err(&format!("cannot add {}", name), err))?;
    zip.write_all(&data)?;
    Ok(())
}

/// Every regular file under `dir`, sorted for a stable archive order.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn bundle_places_images_under_images_dir() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("report.md");
        std::fs::write(&md, "# Report\n").unwrap();
        let images = dir.path().join("imgs");
        std::fs::create_dir_all(images.join("nested")).unwrap();
        std::fs::write(images.join("img_0.png"), b"png0").unwrap();
        std::fs::write(images.join("nested").join("img_1.png"), b"png1").unwrap();

        let dest = dir.path().join("bundle.zip");
        zip_markdown_with_images(&md, &images, &dest).unwrap();

        assert_eq!(
            entry_names(&dest),
            vec!["images/img_0.png", "images/img_1.png", "report.md"]
        );

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut content = String::new();
        archive.by_name("report.md").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "# Report\n");
    }

    #[test]
    fn bundle_without_image_folder_holds_only_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("only.md");
        std::fs::write(&md, "text").unwrap();
        let dest = dir.path().join("out.zip");
        zip_markdown_with_images(&md, &dir.path().join("missing"), &dest).unwrap();
        assert_eq!(entry_names(&dest), vec!["only.md"]);
    }

    #[test]
    fn zip_folder_writes_sibling_archive() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("doc-images");
        std::fs::create_dir_all(folder.join("sub")).unwrap();
        std::fs::write(folder.join("a.png"), b"a").unwrap();
        std::fs::write(folder.join("sub").join("b.png"), b"b").unwrap();

        let archive = zip_folder(&folder).unwrap();
        assert_eq!(archive, dir.path().join("doc-images.zip"));
        assert_eq!(entry_names(&archive), vec!["a.png", "sub/b.png"]);
    }

    #[test]
    fn download_link_embeds_base64_with_mime() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("notes.md");
        std::fs::write(&md, "hi").unwrap();

        let link = download_link(&md, "Download").unwrap();
        assert_eq!(
            link,
            r#"<a href="data:file/text/markdown;base64,aGk=" download="notes.md">Download</a>"#
        );
    }

    #[test]
    fn download_link_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();
        let link = download_link(&path, "x").unwrap();
        assert!(link.starts_with(r#"<a href="data:file/application/octet-stream;base64,AAEC""#));
    }

    #[test]
    fn download_link_missing_file() {
        let err = download_link(Path::new("/nonexistent/file.md"), "x").unwrap_err();
        assert!(matches!(err, ConverterError::Io(_)));
    }
}
