//! Upload, download and streaming transfers.

use std::path::Path;

use bytes::Bytes;
use nwkit_headers::Headers;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::{check_response, next_chunk, prepare, HttpClient};
use crate::control::ControlWatcher;
use crate::error::NwError;
use crate::progress::ProgressTracker;
use crate::request::{url_encoded_pairs, Destination, RequestSpec};
use crate::response::{Downloaded, RawResponse};
use crate::status::ResponseStatus;

impl HttpClient {
    /// Send `form_fields` and `files` as a multipart body.
    ///
    /// Upload progress counts file bytes as the transport consumes them.
    pub async fn upload_raw(&self, spec: &RequestSpec) -> Result<RawResponse, NwError> {
        let form = multipart_form(spec).await?;
        let builder = spec.base_request_builder(self.inner())?.multipart(form);
        self.perform(spec, builder).await
    }

    /// Multipart upload, decoding the response as JSON.
    pub async fn upload<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, NwError> {
        self.upload_raw(spec).await?.json()
    }

    /// Write the response body to the spec's destination, or to a fresh,
    /// uniquely named file in the temporary directory when none is set.
    pub async fn download(&self, spec: &RequestSpec) -> Result<Downloaded, NwError> {
        if let Some(destination) = &spec.destination {
            prepare_destination(destination).await?;
        }

        let builder = spec.request_builder(self.inner())?;
        let request = prepare(spec, builder).await?;
        let mut watcher = spec.control().attach();
        let response = self.send(request, &mut watcher).await?;
        let mut response = check_response(response).await?;

        let destination = match &spec.destination {
            Some(destination) => destination.clone(),
            None => default_destination(spec)?,
        };
        let status = ResponseStatus::from(response.status());
        let headers = Headers::from(response.headers());
        let mut file = open_destination(&destination).await?;

        match write_body(&mut response, &mut file, spec, &mut watcher, &destination.path).await {
            Ok(bytes_written) => {
                debug!(path = %destination.path.display(), bytes_written, "download complete");
                Ok(Downloaded {
                    path: destination.path,
                    bytes_written,
                    status,
                    headers,
                })
            }
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&destination.path).await;
                Err(e)
            }
        }
    }

    /// Hand each body chunk to `on_chunk` as it arrives.
    ///
    /// Only a `200 OK` counts as success; any other status fails with that
    /// status and its reason phrase, before any chunk is delivered.
    pub async fn stream<F>(&self, spec: &RequestSpec, mut on_chunk: F) -> Result<(), NwError>
    where
        F: FnMut(Bytes),
    {
        let builder = spec.request_builder(self.inner())?;
        let request = prepare(spec, builder).await?;
        let mut watcher = spec.control().attach();
        let mut response = self.send(request, &mut watcher).await?;

        if response.status() != StatusCode::OK {
            let status = ResponseStatus::from(response.status());
            return Err(NwError::new(status).with_headers(Headers::from(response.headers())));
        }

        let tracker = ProgressTracker::new(response.content_length(), spec.download_progress.clone());
        while let Some(chunk) = next_chunk(&mut response, &mut watcher).await? {
            tracker.advance(chunk.len() as u64);
            on_chunk(chunk);
        }
        Ok(())
    }
}

async fn multipart_form(spec: &RequestSpec) -> Result<Form, NwError> {
    let mut files = Vec::with_capacity(spec.files.len());
    for part in &spec.files {
        let read_error = |e: std::io::Error| {
            NwError::request_build(format!("failed to read {}: {e}", part.path.display()))
                .with_source(e)
        };
        let file = File::open(&part.path).await.map_err(read_error)?;
        let len = file.metadata().await.map_err(read_error)?.len();
        files.push((part, file, len));
    }

    let total = files.iter().map(|(_, _, len)| len).sum();
    let tracker = ProgressTracker::new(Some(total), spec.upload_progress.clone());

    let mut form = Form::new();
    if let Some(parameters) = spec.parameters.as_ref().filter(|_| !spec.parameters_in_query()) {
        for (name, value) in url_encoded_pairs(parameters) {
            form = form.text(name, value);
        }
    }
    for (name, value) in &spec.form_fields {
        form = form.text(name.clone(), value.clone());
    }

    for (part, file, len) in files {
        let file_name = part
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| part.field.clone());

        let mut file_part = Part::stream_with_length(tracker.file_body(file), len).file_name(file_name);
        if let Some(mime) = &part.mime {
            file_part = file_part.mime_str(mime)?;
        }
        form = form.part(part.field.clone(), file_part);
    }
    Ok(form)
}

/// Creates the file up front, so concurrent downloads of the same name
/// never share a path.
fn default_destination(spec: &RequestSpec) -> Result<Destination, NwError> {
    let name = spec
        .path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("download");
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, format!(".{extension}")),
        _ => (name, String::new()),
    };

    let (_, path) = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(&extension)
        .tempfile_in(std::env::temp_dir())
        .and_then(|file| file.keep().map_err(|e| e.error))
        .map_err(|e| {
            NwError::transport(format!("failed to create download file for {name}: {e}"))
                .with_source(e)
        })?;

    debug!(path = %path.display(), "downloading to temporary file");
    Ok(Destination::new(path).remove_previous_file())
}

/// Checked before anything is sent, so a clash never costs a request.
async fn prepare_destination(destination: &Destination) -> Result<(), NwError> {
    if !destination.remove_previous_file && tokio::fs::metadata(&destination.path).await.is_ok() {
        return Err(NwError::request_build(format!(
            "download destination already exists: {}",
            destination.path.display()
        )));
    }

    if destination.create_intermediate_directories {
        if let Some(parent) = destination.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                NwError::request_build(format!("failed to create {}: {e}", parent.display()))
                    .with_source(e)
            })?;
        }
    }
    Ok(())
}

async fn open_destination(destination: &Destination) -> Result<File, NwError> {
    let mut options = OpenOptions::new();
    options.write(true);
    if destination.remove_previous_file {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    options.open(&destination.path).await.map_err(|e| {
        NwError::transport(format!("failed to open {}: {e}", destination.path.display()))
            .with_source(e)
    })
}

async fn write_body(
    response: &mut reqwest::Response,
    file: &mut File,
    spec: &RequestSpec,
    watcher: &mut ControlWatcher,
    path: &Path,
) -> Result<u64, NwError> {
    let write_error = |e: std::io::Error| {
        NwError::transport(format!("failed to write {}: {e}", path.display())).with_source(e)
    };

    let tracker = ProgressTracker::new(response.content_length(), spec.download_progress.clone());
    let mut written = 0u64;
    while let Some(chunk) = next_chunk(response, watcher).await? {
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
        tracker.advance(chunk.len() as u64);
    }
    file.flush().await.map_err(write_error)?;
    Ok(written)
}
