use crate::rng::Rng;
use crate::types::{BotArchetype, Food, GameConfig, Vec2, Worm};

#[derive(Clone, Debug, PartialEq)]
pub enum MovementStrategy {
    FoodSeeker(FoodSeeker),
    PlayerTracker(PlayerTracker),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FoodSeeker {
    pub wander_chance: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerTracker;

impl MovementStrategy {
    pub fn for_archetype(archetype: BotArchetype, config: &GameConfig) -> Self {
        match archetype {
            BotArchetype::FoodSeeker => Self::FoodSeeker(FoodSeeker {
                wander_chance: config.food_seeker_wander_chance,
            }),
            BotArchetype::PlayerTracker => Self::PlayerTracker(PlayerTracker),
        }
    }

    pub fn archetype(&self) -> BotArchetype {
        match self {
            Self::FoodSeeker(_) => BotArchetype::FoodSeeker,
            Self::PlayerTracker(_) => BotArchetype::PlayerTracker,
        }
    }

    pub fn decide(
        &self,
        bot: &Worm,
        worms: &[&Worm],
        foods: &[&Food],
        rng: &mut Rng,
    ) -> Option<Vec2> {
        match self {
            Self::FoodSeeker(seeker) => seeker.decide(bot, foods, rng),
            Self::PlayerTracker(tracker) => tracker.decide(bot, worms),
        }
    }
}

impl FoodSeeker {
    fn decide(&self, bot: &Worm, foods: &[&Food], rng: &mut Rng) -> Option<Vec2> {
        let head = bot.head();
        let nearest = foods.iter().min_by(|a, b| {
            head.distance(a.position())
                .total_cmp(&head.distance(b.position()))
        });
        if let Some(food) = nearest {
            return head.direction_to(food.position());
        }

        if rng.chance(self.wander_chance) {
            return rng.signed_vector().normalized();
        }
        None
    }
}

impl PlayerTracker {
    fn decide(&self, bot: &Worm, worms: &[&Worm]) -> Option<Vec2> {
        let head = bot.head();
        let nearest = worms
            .iter()
            .filter(|worm| worm.is_player() && !worm.is_dead && worm.id != bot.id)
            .min_by(|a, b| {
                head.distance(a.head())
                    .total_cmp(&head.distance(b.head()))
            })?;
        head.direction_to(nearest.head())
    }
}
