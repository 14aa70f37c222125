use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

const DURATION_SECS: f64 = 2.5;

static ENCOURAGEMENTS: [&str; 6] = [
    "GREAT JOB!",
    "WAY TO GO!",
    "AWESOME!",
    "YOU DID IT!",
    "SUPER!",
    "NICE WORK!",
];

const SYMBOLS: [char; 5] = ['*', '+', '.', 'o', '~'];

/// Particle for the lesson-completed celebration
#[derive(Debug, Clone)]
pub struct CelebrationParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl CelebrationParticle {
    fn new(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SYMBOLS.choose(&mut rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..DURATION_SECS),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += 12.0 * dt; // gravity

        self.age += dt;
        self.age < self.max_age
    }
}

/// Short burst of confetti shown when a lesson is marked completed
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<CelebrationParticle>,
    pub word: &'static str,
    pub start_time: SystemTime,
    pub is_active: bool,
    terminal_width: f64,
    terminal_height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            word: ENCOURAGEMENTS[0],
            start_time: SystemTime::now(),
            is_active: false,
            terminal_width: 80.0,
            terminal_height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.start_time = SystemTime::now();
        self.is_active = true;
        self.terminal_width = width as f64;
        self.terminal_height = height as f64;
        self.word = *ENCOURAGEMENTS.choose(&mut rng).unwrap_or(&ENCOURAGEMENTS[0]);

        let center_x = width as f64 / 2.0;
        let center_y = height as f64 / 2.0;

        for _ in 0..30 {
            let offset_x = rng.gen_range(-15.0..15.0);
            let offset_y = rng.gen_range(-6.0..6.0);
            self.particles.push(CelebrationParticle::new(
                center_x + offset_x,
                center_y + offset_y,
            ));
        }
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let elapsed = self.start_time.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= DURATION_SECS {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let dt = 0.1; // fixed timestep, one tick
        let width = self.terminal_width;
        let height = self.terminal_height;
        self.particles.retain_mut(|particle| {
            let still_alive = particle.update(dt);
            let buffer = 5.0;
            let off_screen = particle.y > height + buffer
                || particle.x < -buffer
                || particle.x > width + buffer;
            still_alive && !off_screen
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
