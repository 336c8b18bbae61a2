// THEORY:
// Hit tests between the avatar and the falling entities. They are pure functions
// of positions and tolerances so the orchestrator decides what a hit means
// (game over, quiz) and in which order they are evaluated.
//
// An obstacle is a box whose top edge is `y` and whose height is `obstacle_size`;
// the avatar is a disc on the lane line. Horizontally both tests compare the
// lane centre with the avatar centre against a fixed tolerance.

use crate::config::SimulationConfig;
use crate::core_modules::player::Player;
use crate::core_modules::simulator::{Coin, Obstacle};

pub fn obstacle_hits_player(obstacle: &Obstacle, player: &Player, config: &SimulationConfig) -> bool {
    let horizontal = (obstacle.lane.x() - player.x).abs() < config.collision_tolerance_x;
    let reaches_top = obstacle.y + config.obstacle_size >= player.y - player.radius;
    let above_bottom = obstacle.y <= player.y + player.radius;
    horizontal && reaches_top && above_bottom
}

pub fn coin_touches_player(coin: &Coin, player: &Player, config: &SimulationConfig) -> bool {
    (coin.lane.x() - player.x).abs() < config.coin_tolerance_x
        && (coin.y - player.y).abs() < config.coin_tolerance_y
}

/// The first obstacle overlapping the avatar, if any.
pub fn first_collision<'a>(
    obstacles: &'a [Obstacle],
    player: &Player,
    config: &SimulationConfig,
) -> Option<&'a Obstacle> {
    obstacles.iter().find(|o| obstacle_hits_player(o, player, config))
}

/// Removes every coin touching the avatar and returns how many were taken.
pub fn collect_coins(coins: &mut Vec<Coin>, player: &Player, config: &SimulationConfig) -> usize {
    let before = coins.len();
    coins.retain(|coin| !coin_touches_player(coin, player, config));
    before - coins.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::simulator::Lane;

    fn lane(index: u8) -> Lane {
        Lane::new(index).unwrap()
    }

    fn player_at(x: f32) -> Player {
        Player::new(x, 550.0, 18.0)
    }

    #[test]
    fn falling_obstacle_hits_player_in_its_lane() {
        let config = SimulationConfig::default();
        let mut obstacle = Obstacle {
            lane: lane(1),
            y: -50.0,
            speed: 4.0,
        };
        for _ in 0..15 {
            obstacle.advance();
        }
        assert_eq!(obstacle.y, 10.0);
        // Box 10..58 against an avatar spanning 12..48.
        let player = Player::new(210.0, 30.0, 18.0);
        assert!(obstacle_hits_player(&obstacle, &player, &config));

        let beside = Player::new(210.0 + 34.0, 30.0, 18.0);
        assert!(!obstacle_hits_player(&obstacle, &beside, &config));
    }

    #[test]
    fn vertical_overlap_edges() {
        let config = SimulationConfig::default();
        let player = player_at(90.0);
        // Bottom edge exactly touches the avatar's top: 484 + 48 = 532.
        let touching = Obstacle { lane: lane(0), y: 484.0, speed: 2.0 };
        assert!(obstacle_hits_player(&touching, &player, &config));
        let above = Obstacle { lane: lane(0), y: 483.0, speed: 2.0 };
        assert!(!obstacle_hits_player(&above, &player, &config));
        // Top edge exactly at the avatar's bottom.
        let at_bottom = Obstacle { lane: lane(0), y: 568.0, speed: 2.0 };
        assert!(obstacle_hits_player(&at_bottom, &player, &config));
        let past = Obstacle { lane: lane(0), y: 568.5, speed: 2.0 };
        assert!(!obstacle_hits_player(&past, &player, &config));
    }

    #[test]
    fn first_collision_skips_other_lanes() {
        let config = SimulationConfig::default();
        let player = player_at(330.0);
        let obstacles = vec![
            Obstacle { lane: lane(0), y: 540.0, speed: 2.0 },
            Obstacle { lane: lane(2), y: 100.0, speed: 2.0 },
            Obstacle { lane: lane(2), y: 530.0, speed: 3.0 },
        ];
        let hit = first_collision(&obstacles, &player, &config);
        assert_eq!(hit.map(|o| o.y), Some(530.0));
    }

    #[test]
    fn collecting_removes_only_touching_coins() {
        let config = SimulationConfig::default();
        let player = player_at(210.0);
        let mut coins = vec![
            Coin { lane: lane(1), y: 560.0, speed: 2.5 },
            Coin { lane: lane(1), y: 300.0, speed: 2.5 },
            Coin { lane: lane(0), y: 550.0, speed: 2.5 },
        ];
        assert_eq!(collect_coins(&mut coins, &player, &config), 1);
        assert_eq!(coins.len(), 2);
        assert_eq!(collect_coins(&mut coins, &player, &config), 0);
    }
}
