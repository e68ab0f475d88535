pub mod count_fingers_use_case;
