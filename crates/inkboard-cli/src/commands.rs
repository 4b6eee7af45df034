use crate::error::{CliError, CliResult, io_error};
use crate::{Command, Source, Target};
use inkboard_core::storage::{FileStorage, Storage, StorageError};
use inkboard_core::{
    CanvasEngine, Document, DrawMode, EngineConfig, ImportSummary, InputEvent, NullSurface,
    StampKind,
};
use inkboard_render::{RasterSurface, RenderConfig, encode_png, parse_color};
use pollster::block_on;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-invocation state. The drawing store is opened on first use, so
/// commands that only touch files never create the store directory.
pub struct Context {
    store_dir: Option<PathBuf>,
    store: Option<Box<dyn Storage>>,
}

impl Context {
    pub fn new(store_dir: Option<PathBuf>) -> Self {
        Self {
            store_dir,
            store: None,
        }
    }

    #[cfg(test)]
    pub fn with_storage(storage: impl Storage + 'static) -> Self {
        Self {
            store_dir: None,
            store: Some(Box::new(storage)),
        }
    }

    fn storage(&mut self) -> CliResult<&dyn Storage> {
        let store = match self.store.take() {
            Some(store) => store,
            None => {
                let storage = match &self.store_dir {
                    Some(dir) => FileStorage::new(dir.clone())?,
                    None => FileStorage::default_location()?,
                };
                log::debug!("Using drawing store at {}", storage.base_path().display());
                Box::new(storage) as Box<dyn Storage>
            }
        };
        Ok(&**self.store.insert(store))
    }
}

pub fn run(command: Command, ctx: &mut Context) -> CliResult<()> {
    match command {
        Command::Render {
            source,
            output,
            width,
            height,
            scale,
            background,
        } => {
            let background = parse_color(&background).ok_or(CliError::InvalidColor(background))?;
            let config = RenderConfig::new(width, height)
                .with_scale(scale)
                .with_background(background);
            let document = read_document(&source, ctx)?;
            render(&document, &output, config)
        }
        Command::Inspect { source } => {
            let document = read_document(&source, ctx)?;
            print!("{}", inspect(&document));
            Ok(())
        }
        Command::Demo { target, config } => {
            let config = match config {
                Some(path) => {
                    let json = fs::read_to_string(&path).map_err(io_error(&path))?;
                    EngineConfig::from_json(&json)?
                }
                None => EngineConfig::default(),
            };
            demo(&target, config, ctx)
        }
        Command::Import { input, name } => {
            let name = match name {
                Some(name) => name,
                None => input
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
                    .ok_or(CliError::Usage("cannot derive a name from the input path"))?,
            };
            import(&input, &name, ctx).map(|_| ())
        }
        Command::List => {
            print!("{}", list(ctx)?);
            Ok(())
        }
        Command::Remove { name } => remove(&name, ctx),
    }
}

fn read_document(source: &Source, ctx: &mut Context) -> CliResult<Document> {
    match (&source.input, &source.id) {
        (Some(path), None) => read_file(path),
        (None, Some(id)) => Ok(block_on(ctx.storage()?.load(id))?),
        _ => Err(CliError::Usage("give either a document file or --id")),
    }
}

fn read_file(path: &Path) -> CliResult<Document> {
    let bytes = fs::read(path).map_err(io_error(path))?;
    Ok(Document::from_slice(&bytes)?)
}

fn render(document: &Document, output: &Path, config: RenderConfig) -> CliResult<()> {
    let mut engine = CanvasEngine::with_config(EngineConfig::default(), RasterSurface::new(config));
    let summary = engine.import_document(document);
    if summary.retained > 0 {
        log::warn!("{} element(s) of unknown type will not be drawn", summary.retained);
    }

    let png = encode_png(&engine.export_image()?)?;
    fs::write(output, png).map_err(io_error(output))?;
    log::info!(
        "Rendered {} element(s) to {} ({}x{})",
        summary.imported,
        output.display(),
        config.width,
        config.height
    );
    Ok(())
}

fn inspect(document: &Document) -> String {
    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for envelope in &document.elements {
        *by_type.entry(envelope.kind.as_str()).or_default() += 1;
    }
    let decoded = document.decode();

    let mut report = format!("version: {}\nenvelopes: {}\n", document.version, document.len());
    for (kind, count) in &by_type {
        log::info!("{}: {} envelope(s)", kind, count);
        report.push_str(&format!("  {}: {}\n", kind, count));
    }
    report.push_str(&format!(
        "decodable: {}\nunresolved: {}\n",
        decoded.elements.len(),
        decoded.unresolved.len()
    ));
    report
}

fn demo(target: &Target, config: EngineConfig, ctx: &mut Context) -> CliResult<()> {
    if target.output.is_none() && target.save.is_none() {
        return Err(CliError::Usage("give --output, --save or both"));
    }
    let mut engine: CanvasEngine<NullSurface> = CanvasEngine::with_config(config, NullSurface);

    engine.set_mode(DrawMode::Pen);
    engine.handle_input(InputEvent::down(40.0, 40.0));
    for (x, y) in [(120.0, 80.0), (200.0, 60.0), (260.0, 120.0)] {
        engine.handle_input(InputEvent::moved(x, y));
    }
    engine.handle_input(InputEvent::PointerUp);

    engine.set_mode(DrawMode::Stamp);
    engine.set_stamp_kind(StampKind::Check);
    engine.handle_input(InputEvent::tap(320.0, 200.0));
    engine.set_stamp_kind(StampKind::Cross);
    engine.handle_input(InputEvent::tap(420.0, 200.0));

    engine.set_mode(DrawMode::Eraser);
    engine.handle_input(InputEvent::down(420.0, 200.0));
    engine.handle_input(InputEvent::PointerUp);
    log::info!("After erase: {} element(s)", engine.len());

    engine.undo();
    engine.redo();

    if let Some(output) = &target.output {
        let json = engine.export_json()?;
        fs::write(output, json).map_err(io_error(output))?;
        log::info!("Wrote demo document with {} element(s) to {}", engine.len(), output.display());
    }
    if let Some(name) = &target.save {
        let document = engine.export_document()?;
        block_on(ctx.storage()?.save(name, &document))?;
        log::info!("Stored demo document as {:?}", name);
    }
    Ok(())
}

/// Pass a document file through the engine and store what it exports.
///
/// The engine repairs ids and styles on the way in, so the stored copy is
/// the normalized drawing. Unknown entries survive when retention is on.
fn import(input: &Path, name: &str, ctx: &mut Context) -> CliResult<ImportSummary> {
    let document = read_file(input)?;
    let mut engine = CanvasEngine::new();
    let summary = engine.import_document(&document);
    if summary.dropped > 0 {
        log::warn!("{} element(s) could not be kept", summary.dropped);
    }

    block_on(ctx.storage()?.save(name, &engine.export_document()?))?;
    log::info!(
        "Stored {} as {:?} ({} element(s), {} retained)",
        input.display(),
        name,
        summary.imported,
        summary.retained
    );
    Ok(summary)
}

fn list(ctx: &mut Context) -> CliResult<String> {
    let storage = ctx.storage()?;
    let mut report = String::new();
    for name in block_on(storage.list())? {
        match block_on(storage.load(&name)) {
            Ok(document) => {
                report.push_str(&format!("{}\t{} element(s)\n", name, document.len()))
            }
            Err(StorageError::Corrupt { source, .. }) => {
                log::warn!("Stored drawing {:?} is unreadable: {}", name, source);
                report.push_str(&format!("{}\tunreadable\n", name));
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(report)
}

fn remove(name: &str, ctx: &mut Context) -> CliResult<()> {
    let storage = ctx.storage()?;
    if !block_on(storage.exists(name))? {
        return Err(StorageError::NotFound(name.to_string()).into());
    }
    block_on(storage.delete(name))?;
    log::info!("Removed stored drawing {:?}", name);
    Ok(())
}
