use log::{debug, info};
use partyforge::adapter::adapter_for;
use partyforge::asm;
use partyforge::build::{build_board, load_board};
use partyforge::config::{EngineConfig, DEFAULT_CONFIG_FILE};
use partyforge::context::BuildContext;
use partyforge::custom::{create_custom_event, validate_custom_event, CustomEventStore};
use partyforge::events::{EventLanguage, EventRegistry};
use partyforge::game::{Game, ALL_GAMES};
use partyforge::image::Image;
use partyforge::symbols::SymbolTable;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn usage(program: &str) {
    println!("partyforge - board event engine for MP1, MP2 and MP3 board overlays");
    println!();
    println!("Usage: {} <command> [arguments]", program);
    println!();
    println!("Commands:");
    println!("  assemble <file.s>                      assemble a source file and dump the words");
    println!("  validate <file.s|file.c>               trial-build a custom event for its games");
    println!("  add <file.s|file.c>                    validate and store a custom event");
    println!("  remove <id>                            forget a stored custom event");
    println!("  events                                 list built-in and stored events");
    println!("  symbols <GAME>                         list the symbols events may reference");
    println!("  boards [GAME]                          list known boards");
    println!("  dump <image> <GAME> <board>            show the board recovered from an image");
    println!("  rebuild <image> <GAME> <board> <out>   load a board and write it back");
    println!();
    println!("Games: MP1_USA, MP2_USA, MP3_USA. Set RUST_LOG=debug for traces.");
}

fn language_of(path: &str) -> EventLanguage {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("c") => EventLanguage::C,
        _ => EventLanguage::Assembly,
    }
}

fn read_source(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    fs::read_to_string(path).map_err(|e| format!("Cannot read '{}': {}", path, e).into())
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str, Box<dyn std::error::Error>> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing {}", what).into())
}

fn registry_with_store(store: &CustomEventStore) -> Result<EventRegistry, Box<dyn std::error::Error>> {
    let mut registry = EventRegistry::new()?;
    store.register_all(&mut registry)?;
    Ok(registry)
}

fn assemble(path: &str) -> CliResult {
    let source = read_source(path)?;
    let assembly = asm::assemble(&source)?;
    println!(
        "{} instructions, {} bytes at {:#010x}",
        assembly.instruction_count,
        assembly.len(),
        assembly.base
    );
    for (i, chunk) in assembly.bytes.chunks(4).enumerate() {
        let word = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
        println!("{:#010x}: {:08x}", assembly.base as usize + i * 4, word);
    }
    Ok(())
}

/// Trial-build `path`; returns whether every game passed.
fn validate(path: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let def = create_custom_event(language_of(path), &source)?;
    let results = validate_custom_event(&def);
    for result in &results {
        println!("{}", result);
    }
    Ok(results.iter().all(|r| r.is_ok()))
}

fn add(path: &str, store: &mut CustomEventStore) -> CliResult {
    let source = read_source(path)?;
    let def = create_custom_event(language_of(path), &source)?;
    let failures: Vec<_> = validate_custom_event(&def)
        .into_iter()
        .filter(|r| !r.is_ok())
        .collect();
    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{}", failure);
        }
        return Err(format!("'{}' does not build for every declared game", def.id).into());
    }
    // Built-in ids are reserved
    registry_with_store(store)?.register_custom(def.clone())?;
    store.insert(&def)?;
    store.save()?;
    println!("Stored '{}' in {}", def.id, store.path().display());
    Ok(())
}

fn remove(id: &str, store: &mut CustomEventStore) -> CliResult {
    if store.remove(id).is_none() {
        return Err(format!("No stored event '{}'", id).into());
    }
    store.save()?;
    println!("Removed '{}'", id);
    Ok(())
}

fn events(store: &CustomEventStore) -> CliResult {
    let registry = registry_with_store(store)?;
    for def in registry.list() {
        println!("{}", def);
    }
    Ok(())
}

fn symbols(game: Game) {
    for symbol in SymbolTable::for_game(game).symbols() {
        println!("{}", symbol);
    }
}

fn boards(games: &[Game]) {
    for &game in games {
        for info in adapter_for(game).boards() {
            println!(
                "{} {:>2}  {:<24} {:?}, overlay at {:#010x}, {} slot(s)",
                game,
                info.index,
                info.name,
                info.board_type,
                info.overlay.ram_start,
                info.slots.len()
            );
        }
    }
}

fn read_image(path: &str) -> Result<Image, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("Cannot read image '{}': {}", path, e))?;
    Ok(Image::new(bytes))
}

fn dump(args: &[String], store: &CustomEventStore) -> CliResult {
    let image = read_image(arg(args, 2, "image path")?)?;
    let game: Game = arg(args, 3, "game")?.parse()?;
    let index: usize = arg(args, 4, "board index")?.parse()?;
    let registry = registry_with_store(store)?;
    let mut ctx = BuildContext::new();
    let board = load_board(&image, game, index, &registry, &mut ctx)?;

    println!("{} ({}, {:?})", board.name, game, board.board_type);
    for (i, space) in board.spaces.iter().enumerate() {
        let events: Vec<&str> = space.events.iter().map(|e| e.event_id.as_str()).collect();
        println!(
            "{:>3}  {:<10} ({:>7.1}, {:>7.1})  -> {:?}  {}{}",
            i,
            format!("{:?}", space.space_type),
            space.position.x,
            space.position.y,
            board.connections_from(i),
            if space.star { "[star] " } else { "" },
            events.join(", ")
        );
    }
    for (i, chain) in board.chains().chains().iter().enumerate() {
        println!("chain {}: {:?} exits {:?}", i, chain.spaces, chain.exits);
    }
    Ok(())
}

fn rebuild(args: &[String], config: &EngineConfig, store: &CustomEventStore) -> CliResult {
    let mut image = read_image(arg(args, 2, "image path")?)?;
    let game: Game = arg(args, 3, "game")?.parse()?;
    let index: usize = arg(args, 4, "board index")?.parse()?;
    let out = arg(args, 5, "output path")?;
    let registry = registry_with_store(store)?;
    let mut ctx = BuildContext::new();
    let board = load_board(&image, game, index, &registry, &mut ctx)?;
    let patches = build_board(&mut image, &board, index, &registry, &mut ctx, &config.build)?;
    fs::write(out, image.bytes()).map_err(|e| format!("Cannot write '{}': {}", out, e))?;
    for patch in &patches {
        debug!("patched {}", patch);
    }
    println!("Wrote {} ({} patches)", out, patches.len());
    Ok(())
}

fn run(args: &[String]) -> Result<bool, Box<dyn std::error::Error>> {
    let config = EngineConfig::load(Path::new(DEFAULT_CONFIG_FILE))?;
    let mut store = CustomEventStore::load(&config.custom_events)?;
    info!("{} stored custom event(s)", store.len());

    match args[1].as_str() {
        "assemble" => assemble(arg(args, 2, "source file")?)?,
        "validate" => return validate(arg(args, 2, "source file")?),
        "add" => add(arg(args, 2, "source file")?, &mut store)?,
        "remove" => remove(arg(args, 2, "event id")?, &mut store)?,
        "events" => events(&store)?,
        "symbols" => symbols(arg(args, 2, "game")?.parse()?),
        "boards" => match args.get(2) {
            Some(game) => boards(&[game.parse()?]),
            None => boards(&ALL_GAMES),
        },
        "dump" => dump(args, &store)?,
        "rebuild" => rebuild(args, &config, &store)?,
        other => return Err(format!("Unknown command '{}'", other).into()),
    }
    Ok(true)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        usage(args.first().map(String::as_str).unwrap_or("partyforge"));
        return;
    }

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
