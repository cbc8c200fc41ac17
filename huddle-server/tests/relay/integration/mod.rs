mod disconnect_tests;
