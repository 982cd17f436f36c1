//! ASCII grid rendering for the client's own (partial) view, grounded
//! on `original_source/treasure_client.c:imprimir_grid` — unlike the
//! server's view, unfound treasures never show.

use protocol::collaborators::GridRenderer;
use protocol::game::{GameState, Position, GRID_SIZE, NUM_TREASURES};

pub struct ClientGridRenderer;

impl GridRenderer for ClientGridRenderer {
    fn render(&mut self, game: &GameState) {
        print!("\x1b[2J\x1b[H");
        println!("CLIENTE - CACA AO TESOURO");
        println!("=========================\n");
        println!("Sua posicao: ({},{})\n", game.player.x, game.player.y);

        let found: Vec<_> = game.treasures.iter().filter(|t| t.found).collect();
        println!("Tesouros encontrados: {} de {NUM_TREASURES}\n", found.len());

        println!("Grid do jogo:");
        print!("  ");
        for x in 0..GRID_SIZE as u8 {
            print!(" {x} ");
        }
        println!();
        print!("  ");
        for _ in 0..GRID_SIZE {
            print!("---");
        }
        println!();

        for y in (0..GRID_SIZE as u8).rev() {
            print!("{y} |");
            for x in 0..GRID_SIZE as u8 {
                let pos = Position::new(x, y);
                let cell = if game.player == pos {
                    'J'
                } else if game.is_visited(pos) {
                    if game.treasures.iter().any(|t| t.pos == pos && t.found) { 'X' } else { '.' }
                } else {
                    ' '
                };
                print!(" {cell} ");
            }
            println!("|");
        }
        print!("  ");
        for _ in 0..GRID_SIZE {
            print!("---");
        }
        println!("\n");

        println!("Legenda: J = Jogador, X = Tesouro encontrado, . = Visitado");
        println!("Tesouros encontrados:");
        if found.is_empty() {
            println!("Nenhum tesouro encontrado ainda.");
        } else {
            for (i, t) in found.iter().enumerate() {
                println!("{}: {} - ({},{})", i + 1, t.name, t.pos.x, t.pos.y);
            }
        }
        println!();
        println!("Comandos: W=cima  S=baixo  A=esquerda  D=direita  Q=sair");
    }
}
