pub mod finger_counter;
