use notebook::{Block, BlockOutput, BlockType, NotebookSession, RunOutput, SearchResults};
use tracing::debug;

/// Run every block. Markdown renders inline; query blocks are started first
/// and executed concurrently, then written back through their tickets.
pub fn run_all(session: &mut NotebookSession) {
    let ids: Vec<_> = session.blocks().iter().map(|b| b.id.clone()).collect();

    let mut tickets = Vec::new();
    for id in &ids {
        match session.notebook().block(id).map(Block::block_type) {
            Some(BlockType::Markdown) => session.run_block(id),
            Some(BlockType::Query) => tickets.extend(session.start_run(id)),
            None => {}
        }
    }

    let dispatcher = session.notebook().dispatcher();
    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = tickets
            .iter()
            .map(|ticket| scope.spawn(move || dispatcher.execute(ticket)))
            .collect();
        handles
            .into_iter()
            .zip(&tickets)
            .map(|(handle, ticket)| {
                handle.join().unwrap_or_else(|_| {
                    Err(notebook::ExecutionError::Search(format!(
                        "search thread for block {} panicked",
                        ticket.block_id
                    )))
                })
            })
            .collect()
    });

    for (ticket, outcome) in tickets.iter().zip(outcomes) {
        if !session.complete_run(ticket, outcome) {
            debug!(block = %ticket.block_id, "run result discarded");
        }
    }
}

/// Number of blocks whose last run failed.
pub fn failure_count(blocks: &[Block]) -> usize {
    blocks.iter().filter(|b| b.error().is_some()).count()
}

pub fn print_blocks(blocks: &[Block]) {
    for (index, block) in blocks.iter().enumerate() {
        match &block.output {
            BlockOutput::Markdown { rendered } => {
                println!("[{}] md", index + 1);
                match rendered {
                    Some(RunOutput::Ready(html)) => print!("{}", html),
                    Some(RunOutput::Failed(err)) => println!("error: {}", err),
                    Some(RunOutput::Pending) => println!("(pending)"),
                    None => println!("(not run)"),
                }
            }
            BlockOutput::Query { result } => {
                println!("[{}] query: {}", index + 1, block.input);
                match result {
                    Some(RunOutput::Ready(results)) => print_results(results),
                    Some(RunOutput::Failed(err)) => println!("error: {}", err),
                    Some(RunOutput::Pending) => println!("(pending)"),
                    None => println!("(not run)"),
                }
            }
        }
        println!();
    }
}

fn print_results(results: &SearchResults) {
    for file in &results.files {
        if file.line_matches.is_empty() {
            println!("{}", file.path);
        }
        for line in &file.line_matches {
            println!("{}:{}: {}", file.path, line.line_number, line.preview);
        }
    }
    let plural = if results.match_count == 1 { "" } else { "es" };
    if results.limit_hit {
        println!("({} match{}, limit hit)", results.match_count, plural);
    } else {
        println!("({} match{})", results.match_count, plural);
    }
}

#[cfg(test)]
mod tests {
    use notebook::{
        BlockInitializer, Dispatcher, ExecutionError, FileMatch, Notebook, SearchBackend,
    };

    use super::*;

    struct PathEcho;

    impl SearchBackend for PathEcho {
        fn execute(&self, query: &str) -> Result<SearchResults, ExecutionError> {
            if query == "fail" {
                return Err(ExecutionError::Search("boom".to_string()));
            }
            Ok(SearchResults {
                files: vec![FileMatch {
                    path: query.to_string(),
                    line_matches: Vec::new(),
                }],
                match_count: 1,
                limit_hit: false,
            })
        }
    }

    fn session(blocks: Vec<BlockInitializer>) -> NotebookSession {
        NotebookSession::with_logger(
            Notebook::with_dispatcher(blocks, Dispatcher::with_search(PathEcho)),
            notebook::events::NoopEventLogger,
        )
    }

    #[test]
    fn runs_every_block() {
        let mut session = session(vec![
            BlockInitializer::markdown("# A"),
            BlockInitializer::query("a.rs"),
            BlockInitializer::query("b.rs"),
        ]);
        run_all(&mut session);

        let blocks = session.blocks();
        assert_eq!(blocks[0].rendered(), Some("<h1>A</h1>\n"));
        assert_eq!(blocks[1].results().unwrap().files[0].path, "a.rs");
        assert_eq!(blocks[2].results().unwrap().files[0].path, "b.rs");
        assert_eq!(failure_count(blocks), 0);
    }

    #[test]
    fn failed_query_is_counted() {
        let mut session = session(vec![
            BlockInitializer::query("fail"),
            BlockInitializer::query("ok.rs"),
        ]);
        run_all(&mut session);

        let blocks = session.blocks();
        assert_eq!(
            blocks[0].error(),
            Some(&ExecutionError::Search("boom".to_string()))
        );
        assert!(blocks[1].results().is_some());
        assert_eq!(failure_count(blocks), 1);
    }

    #[test]
    fn empty_notebook_runs_nothing() {
        let mut session = session(Vec::new());
        run_all(&mut session);
        assert_eq!(failure_count(session.blocks()), 0);
    }
}
