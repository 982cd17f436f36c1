//! ASCII grid rendering, line-for-line grounded on
//! `original_source/treasure_server.c:imprimir_grid` — the server's
//! privileged view shows unfound treasures too.

use protocol::collaborators::GridRenderer;
use protocol::game::{GameState, GRID_SIZE, NUM_TREASURES};

pub struct ServerGridRenderer;

impl GridRenderer for ServerGridRenderer {
    fn render(&mut self, game: &GameState) {
        print!("\x1b[2J\x1b[H");
        println!("SERVIDOR DE CACA AO TESOURO");
        println!("===========================\n");
        println!("Posicao do jogador: ({},{})\n", game.player.x, game.player.y);

        let found = game.treasures.iter().filter(|t| t.found).count();
        println!("Tesouros encontrados: {found} de {NUM_TREASURES}\n");

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
                let pos = protocol::game::Position::new(x, y);
                let cell = if game.player == pos {
                    'J'
                } else if game.is_visited(pos) {
                    if game.has_treasure_at(pos) {
                        if game.treasures.iter().any(|t| t.pos == pos && t.found) { 'X' } else { 'T' }
                    } else {
                        '.'
                    }
                } else if game.has_treasure_at(pos) {
                    'T'
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

        println!("Legenda: J = Jogador, T = Tesouro, X = Tesouro encontrado, . = Visitado\n");
        println!("Detalhes dos tesouros:");
        for (i, t) in game.treasures.iter().enumerate() {
            println!(
                "Tesouro {}: ({},{}) - {} - {}",
                i + 1,
                t.pos.x,
                t.pos.y,
                t.name,
                if t.found { "ENCONTRADO" } else { "nao encontrado" }
            );
        }
    }
}
