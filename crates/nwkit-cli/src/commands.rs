//! Subcommand implementations.
//!
//! Output goes to the writer handed in; progress and diagnostics go to
//! the log.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use nwkit_http::{
    Destination, FilePart, Headers, HttpClient, Method, Progress, RawResponse, RequestSpec,
    ResponseStatus,
};
use tracing::{debug, info};

use crate::cli::{Command, GetCommand, HeadersCommand, RequestArgs, StreamCommand};

/// Run `command` with `client`, cancelling the request on Ctrl-C.
pub async fn execute<W: Write>(command: Command, client: &HttpClient, out: &mut W) -> Result<()> {
    let spec = build_spec(&command)?;
    let control = spec.control().clone();

    let run = dispatch(&command, &spec, client, out);
    tokio::pin!(run);

    let finished = tokio::select! {
        result = &mut run => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match finished {
        Some(result) => result,
        None => {
            info!("interrupted, cancelling request");
            control.cancel();
            run.await
        }
    }
}

async fn dispatch<W: Write>(
    command: &Command,
    spec: &RequestSpec,
    client: &HttpClient,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Get(cmd) => get(cmd, spec, client, out).await,
        Command::Download(_) => download(spec, client, out).await,
        Command::Upload(_) => upload(spec, client, out).await,
        Command::Stream(_) => stream(spec, client, out).await,
        Command::Headers(cmd) => headers(cmd, spec, client, out).await,
    }
}

pub fn build_spec(command: &Command) -> Result<RequestSpec> {
    let spec = match command {
        Command::Get(cmd) => {
            let mut spec = base_spec(&cmd.request)?.method(parse_method(&cmd.method)?);
            if let Some(data) = &cmd.data {
                let body: serde_json::Value =
                    serde_json::from_str(data).context("--data is not valid JSON")?;
                spec = spec.json_body(&body)?;
            }
            spec
        }
        Command::Download(cmd) => {
            let spec = base_spec(&cmd.request)?.download_progress(log_progress("download"));
            match &cmd.output {
                Some(path) => {
                    let mut destination = Destination::new(path);
                    destination.remove_previous_file = cmd.force;
                    destination.create_intermediate_directories = cmd.mkdir;
                    spec.destination(destination)
                }
                None => spec,
            }
        }
        Command::Upload(cmd) => {
            let mut spec = base_spec(&cmd.request)?
                .method(parse_method(&cmd.method)?)
                .upload_progress(log_progress("upload"));
            for (name, value) in &cmd.fields {
                spec = spec.form_field(name, value);
            }
            for (field, path) in &cmd.files {
                spec = spec.file(FilePart::new(field, path));
            }
            spec
        }
        Command::Stream(StreamCommand { request }) => base_spec(request)?,
        Command::Headers(cmd) => base_spec(&cmd.request)?.method(Method::HEAD),
    };
    Ok(spec)
}

fn base_spec(args: &RequestArgs) -> Result<RequestSpec> {
    let mut spec = RequestSpec::from_url(&args.url)?;
    for (name, value) in &args.headers {
        spec = spec.header(name, value)?;
    }
    if let Some(secs) = args.timeout {
        spec = spec.timeout(Duration::from_secs(secs));
    }
    Ok(spec)
}

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method `{method}`"))
}

fn log_progress(kind: &'static str) -> impl Fn(Progress) + Send + Sync + 'static {
    move |progress| match progress.fraction() {
        Some(fraction) => debug!(kind, completed = progress.completed, percent = fraction * 100.0, "progress"),
        None => debug!(kind, completed = progress.completed, "progress"),
    }
}

async fn get<W: Write>(
    cmd: &GetCommand,
    spec: &RequestSpec,
    client: &HttpClient,
    out: &mut W,
) -> Result<()> {
    let response = client.fire_raw(spec).await?;

    if let Some(name) = &cmd.canonical {
        return print_canonical(&response, name, out);
    }
    if cmd.include {
        print_head(&response.status, &response.headers, out)?;
        writeln!(out)?;
    }
    out.write_all(&response.body)?;
    Ok(())
}

async fn headers<W: Write>(
    cmd: &HeadersCommand,
    spec: &RequestSpec,
    client: &HttpClient,
    out: &mut W,
) -> Result<()> {
    let mut response = client.fire_raw(spec).await?;

    if let Some(name) = &cmd.canonical {
        return print_canonical(&response, name, out);
    }
    print_head(&response.status, &response.headers, out)?;
    writeln!(out, "keep-alive: {}", response.keep_alive())?;
    Ok(())
}

async fn download<W: Write>(spec: &RequestSpec, client: &HttpClient, out: &mut W) -> Result<()> {
    let downloaded = client.download(spec).await?;
    print_head(&downloaded.status, &downloaded.headers, out)?;
    writeln!(
        out,
        "\nsaved {} ({} bytes)",
        downloaded.path.display(),
        downloaded.bytes_written
    )?;
    Ok(())
}

async fn upload<W: Write>(spec: &RequestSpec, client: &HttpClient, out: &mut W) -> Result<()> {
    let response = client.upload_raw(spec).await?;
    print_head(&response.status, &response.headers, out)?;
    writeln!(out)?;
    out.write_all(&response.body)?;
    Ok(())
}

async fn stream<W: Write>(spec: &RequestSpec, client: &HttpClient, out: &mut W) -> Result<()> {
    let mut write_error = None;
    client
        .stream(spec, |chunk| {
            if write_error.is_none() {
                if let Err(e) = out.write_all(&chunk).and_then(|_| out.flush()) {
                    write_error = Some(e);
                }
            }
        })
        .await?;

    if let Some(e) = write_error {
        return Err(e).context("failed to write stream output");
    }
    Ok(())
}

fn print_head<W: Write>(status: &ResponseStatus, headers: &Headers, out: &mut W) -> Result<()> {
    writeln!(out, "{status}")?;
    for (name, value) in headers {
        writeln!(out, "{name}: {value}")?;
    }
    Ok(())
}

fn print_canonical<W: Write>(response: &RawResponse, name: &str, out: &mut W) -> Result<()> {
    if !response.headers.contains(name) {
        bail!("response has no `{name}` header");
    }
    for piece in response.headers.canonical_form(name) {
        writeln!(out, "{piece}")?;
    }
    Ok(())
}
